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

//! Lemma Language Server Protocol (LSP) Implementation
//!
//! This crate provides IDE integration for lemma proof scripts through the
//! Language Server Protocol. Checking a proof script is slow compared to the
//! editor's requests, so the server checks documents incrementally in the
//! background and answers each request as soon as the part of the document
//! it depends on has been checked.
//!
//! # Features
//!
//! - **Diagnostics**: Published when checking of a document finishes or fails
//! - **Progress**: A `$/lemma/fileProgress` notification after every increment
//! - **Hover**: Declarations, tactics and proof state under the cursor
//! - **Goals**: The custom `proof/goals` request returns the open goals
//! - **Autocomplete**: Keywords, tactics, hypotheses and declared names
//! - **Document Symbols**: Outline view of declared names
//!
//! # Scheduling
//!
//! All document state lives on one scheduler thread. The transport only
//! decodes messages and submits them to the request queue:
//!
//! 1. **Requests first**: every submit interrupts the running checking
//!    increment, and queued messages are always dispatched before more
//!    checking happens.
//! 2. **Postponement**: a request whose answer depends on unchecked text is
//!    parked in the postponed-request table and answered as soon as checking
//!    moves past its position.
//! 3. **Cancellation**: postponed requests are cancelled when the client
//!    cancels them, when the document changes, or when a newer request on
//!    the same document targets an earlier position.
//!
//! # Memory Management
//!
//! - **Document Size Limit**: Maximum 64MB per document (configurable)
//! - **UTF-8 Safety**: All string slicing operations are UTF-8 boundary aware
//!
//! # Usage
//!
//! ## Running the Server
//!
//! ```bash
//! # Run the language server (stdio transport)
//! lemma-lsp
//!
//! # With debug logging
//! RUST_LOG=debug lemma-lsp
//! ```
//!
//! ## Programmatic Usage
//!
//! ```no_run
//! use lemma_lsp::LemmaLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::build(LemmaLanguageServer::new)
//!         .custom_method("proof/goals", LemmaLanguageServer::goals)
//!         .finish();
//!
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! # Architecture
//!
//! - `backend`: tower-lsp frontend feeding the request queue
//! - [`queue`]: Request queue and interrupt signalling
//! - [`scheduler`]: The checking/dispatch loop
//! - [`readiness`]: Whether a position has been checked
//! - [`outcome`]: Handler outcomes and panic isolation
//! - [`postponed`]: Requests waiting for checking to catch up
//! - [`cancellation`]: Client, edit, close and supersession cancellation
//! - [`document_manager`]: Open documents and checking rotation
//! - [`hover`], [`goals`], [`completion`], [`symbols`]: Request handlers
//! - [`utils`]: Position conversion and safe string handling

mod backend;
pub mod cancellation;
pub mod completion;
pub mod config;
pub mod constants;
pub mod document_manager;
pub mod error;
pub mod goals;
pub mod hover;
pub mod message;
pub mod outcome;
pub mod postponed;
pub mod queue;
pub mod readiness;
pub mod reply;
pub mod scheduler;
pub mod symbols;
pub mod utils;


pub use backend::LemmaLanguageServer;
pub use config::ServerConfig;
pub use error::ServerError;
pub use message::{Incoming, Notification, Outgoing, Rejected, Request, RequestId};
pub use outcome::{Deferral, Outcome};
pub use queue::{request_queue, QueueReceiver, QueueSender};
pub use scheduler::{Handlers, Scheduler, Step};

/// LSP server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
