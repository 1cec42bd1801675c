// Dweve Lemma - Incremental Proof Checking
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server configuration.
//!
//! Configuration comes from command-line flags (see `main.rs`) and may be
//! overridden by the client's `initializationOptions`:
//!
//! ```json
//! {
//!   "maxDocumentSize": 1048576,
//!   "sentencesPerIncrement": 8,
//!   "supersedePostponed": true
//! }
//! ```

use crate::constants::{DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_SENTENCES_PER_INCREMENT};
use serde::{Deserialize, Serialize};

/// Tunables of the checking scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Maximum document size in bytes; larger documents are rejected.
    pub max_document_size: usize,
    /// Sentences checked per increment before the scheduler looks at the
    /// request queue again.
    pub sentences_per_increment: usize,
    /// Cancel a postponed request when a newer one on the same document
    /// targets an earlier position.
    pub supersede_postponed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            sentences_per_increment: DEFAULT_SENTENCES_PER_INCREMENT,
            supersede_postponed: true,
        }
    }
}

impl ServerConfig {
    /// Parse `initializationOptions`; missing fields keep their defaults.
    pub fn from_options(options: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(options)
    }

    /// Overlay `initializationOptions` on this configuration. Fields missing
    /// from `options` keep their current values.
    pub fn merged(&self, options: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base), serde_json::Value::Object(overrides)) = (base.as_object_mut(), options) {
            base.extend(overrides);
        }
        Self::from_options(base)
    }
}
