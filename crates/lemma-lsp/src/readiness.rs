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

//! When is the answer to a positional query settled?
//!
//! A query at position `P` depends only on the sentences before `P`. Once the
//! checking frontier has moved strictly past `P`, nothing the checker does
//! later can change the answer, so it is safe to reply. Whole-document
//! queries have to wait until checking is done.
//!
//! The predicate is pure: it gives the same result whether evaluated when
//! the request arrives or when a postponed request is woken up.

use lemma_core::{Completion, Position};

/// Decide whether a query is answerable now.
///
/// - `status`: completion status of the target document.
/// - `target`: queried position, `None` for whole-document queries.
/// - `required_version`: version the query was issued against, if known.
/// - `current_version`: version of the document that `status` describes.
pub fn ready(
    status: &Completion,
    target: Option<Position>,
    required_version: Option<i32>,
    current_version: i32,
) -> bool {
    if let Some(required) = required_version {
        if current_version < required {
            return false;
        }
    }

    match status {
        Completion::Done { .. } => true,
        Completion::Failed { range } | Completion::Stopped { range } => {
            target.map_or(false, |position| position < range.end)
        }
    }
}
