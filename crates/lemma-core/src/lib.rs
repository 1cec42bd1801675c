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

//! Incremental checking engine for lemma proof scripts.
//!
//! This crate turns the text of a proof script into a sequence of checked
//! nodes, one per sentence, and exposes the checking process as a resumable
//! computation:
//!
//! - [`Document::resume`] checks a bounded number of sentences and yields
//!   early when its [`Interrupt`] is raised.
//! - [`Document::completion`] reports how far checking got as a
//!   [`Completion`] (done, failed at a sentence, or stopped part-way).
//! - Checked nodes carry the proof state ([`Goal`]s) and messages, which the
//!   language server uses to answer hover and goal queries.
//!
//! # Script Language
//!
//! ```text
//! Definition double (n : nat) := n + n.
//! Lemma id : A -> A.
//! Proof.
//!   intros.
//!   assumption.
//! Qed.
//! ```
//!
//! The first error stops checking; the document then stays failed until it
//! is replaced by a new version.

mod command;
mod document;
mod error;
mod interrupt;
mod position;
mod proof;
mod sentence;
mod status;

pub use command::{
    is_identifier, DECLARATION_KEYWORDS, GOAL_KEYWORDS, KNOWN_TACTICS, QUERY_KEYWORDS,
};
pub use document::{Declaration, Diagnostic, Document, Node, Severity};
pub use error::{CheckError, CheckErrorKind, CheckResult};
pub use interrupt::Interrupt;
pub use position::{Position, Range};
pub use proof::{Goal, ProofState};
pub use sentence::{split_sentences, Sentence};
pub use status::Completion;
