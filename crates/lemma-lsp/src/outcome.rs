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

//! Normalizing handler results.
//!
//! Every request handler ends in exactly one [`Outcome`]. Panics inside a
//! handler are caught here and turned into an internal-error outcome, so a
//! single faulty handler never takes the scheduler down with it.

use crate::error::internal_error;
use lemma_core::Position;
use serde::Serialize;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tower_lsp::jsonrpc::Error as RpcError;
use tracing::error;

/// Why a handler could not answer yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    /// Wait until checking has moved past this position.
    At(Position),
    /// Wait until the whole document is checked.
    UntilDone,
}

impl Deferral {
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::At(position) => Some(*position),
            Self::UntilDone => None,
        }
    }
}

/// Result of running a request handler once.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered(Value),
    Failed(RpcError),
    Deferred(Deferral),
}

impl Outcome {
    /// Serialize `value` as the answer.
    pub fn answered<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Answered(value),
            Err(e) => Self::Failed(internal_error(format!("failed to serialize result: {}", e))),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run a handler, converting a panic into an internal-error outcome.
pub fn classify<F>(method: &str, handler: F) -> Outcome
where
    F: FnOnce() -> Outcome,
{
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Handler for {} panicked: {}", method, message);
            Outcome::Failed(internal_error(format!("internal error in {}: {}", method, message)))
        }
    }
}
