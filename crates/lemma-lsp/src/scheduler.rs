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

//! The checking/dispatch scheduler.
//!
//! A single worker owns every open document, the postponed-request table
//! and the consumer side of the request queue. Each cycle it peeks the
//! queue:
//!
//! 1. **Queue non-empty**: pop one message and dispatch it. Notifications
//!    update documents; requests run their handler and go through
//!    [`classify`].
//! 2. **Queue empty**: run one checking increment on the next document in the
//!    rotation, then wake and answer the postponed requests that became
//!    ready.
//!
//! Requests always win over background checking: every submit raises the
//! queue's interrupt, and the running increment yields at its next sentence.
//!
//! # Example
//!
//! ```
//! use lemma_lsp::message::{Incoming, Notification, Outgoing, Request, RequestId};
//! use lemma_lsp::queue::request_queue;
//! use lemma_lsp::reply::Replies;
//! use lemma_lsp::scheduler::Scheduler;
//! use lemma_lsp::ServerConfig;
//! use tower_lsp::lsp_types::{Position, Url};
//!
//! let (queue, receiver) = request_queue();
//! let (replies, mut outgoing) = Replies::channel();
//! let uri = Url::parse("file:///hello.v").unwrap();
//!
//! queue.submit(Incoming::Notification(Notification::DidOpen {
//!     uri: uri.clone(),
//!     version: 1,
//!     text: "Check nat.".to_string(),
//! })).unwrap();
//! queue.submit(Incoming::Request {
//!     id: RequestId(1),
//!     request: Request::Hover { uri, position: Position::new(0, 2) },
//! }).unwrap();
//! drop(queue);
//!
//! Scheduler::new(receiver, replies, ServerConfig::default()).run();
//!
//! let answered = std::iter::from_fn(|| outgoing.try_recv().ok())
//!     .any(|message| matches!(message, Outgoing::Response { id: RequestId(1), result: Ok(_) }));
//! assert!(answered);
//! ```

use crate::cancellation::{cancel_by_client, close_document, invalidate_document, supersede};
use crate::completion::handle_completion;
use crate::config::ServerConfig;
use crate::constants::SCHEDULER_THREAD_NAME;
use crate::document_manager::DocumentManager;
use crate::error::{document_not_open, internal_error, shutting_down, ServerError};
use crate::goals::handle_goals;
use crate::hover::handle_hover;
use crate::message::{Incoming, Notification, Rejected, Request, RequestId};
use crate::outcome::{classify, Deferral, Outcome};
use crate::postponed::{PendingEntry, PostponedTable};
use crate::queue::{Popped, QueueReceiver};
use crate::reply::Replies;
use crate::symbols::handle_document_symbols;
use crate::utils::to_core_position;
use lemma_core::{Completion, Document, Interrupt, Position};
use std::collections::HashSet;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tower_lsp::lsp_types::{MessageType, Position as LspPosition, Url};
use tracing::{debug, error, info, warn};

/// Handler for requests targeting a position.
pub type PositionHandler = fn(&Document, Position) -> Outcome;

/// Handler for whole-document requests.
pub type DocumentHandler = fn(&Document) -> Outcome;

/// One checking increment: at most `budget` sentences, yielding on interrupt.
pub type CheckHandler = fn(&mut Document, &Interrupt, usize) -> Completion;

/// Registration table mapping request kinds to their handlers, plus the
/// checking increment the scheduler runs between requests.
#[derive(Clone, Copy)]
pub struct Handlers {
    pub hover: PositionHandler,
    pub goals: PositionHandler,
    pub completion: PositionHandler,
    pub document_symbol: DocumentHandler,
    pub check: CheckHandler,
}

fn resume(doc: &mut Document, interrupt: &Interrupt, budget: usize) -> Completion {
    doc.resume(interrupt, budget)
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            hover: handle_hover,
            goals: handle_goals,
            completion: handle_completion,
            document_symbol: handle_document_symbols,
            check: resume,
        }
    }
}

impl Handlers {
    /// Run the handler registered for `request` against `doc`.
    ///
    /// Client positions are converted to checker positions against the text
    /// of `doc`.
    pub fn run(&self, request: &Request, doc: &Document) -> Outcome {
        let at = |position: &LspPosition| to_core_position(doc.text(), *position);
        match request {
            Request::Hover { position, .. } => (self.hover)(doc, at(position)),
            Request::Goals { position, .. } => (self.goals)(doc, at(position)),
            Request::Completion { position, .. } => (self.completion)(doc, at(position)),
            Request::DocumentSymbol { .. } => (self.document_symbol)(doc),
        }
    }
}

/// What one scheduling cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A queued message was dispatched.
    Dispatched,
    /// A checking increment ran; `woken` postponed requests were answered.
    Checked { woken: usize },
    /// Nothing queued and nothing left to check.
    Idle,
    /// Every queue sender is gone and nothing is left to check.
    Closed,
    /// A shutdown message was dispatched.
    Shutdown,
}

/// The single worker that owns documents and postponed requests.
pub struct Scheduler {
    queue: QueueReceiver,
    replies: Replies,
    documents: DocumentManager,
    table: PostponedTable,
    handlers: Handlers,
    config: ServerConfig,
    /// Documents whose checking panicked; cleared by the next edit.
    faulted: HashSet<Url>,
}

impl Scheduler {
    pub fn new(queue: QueueReceiver, replies: Replies, config: ServerConfig) -> Self {
        Self {
            queue,
            replies,
            documents: DocumentManager::new(config.max_document_size),
            table: PostponedTable::new(),
            handlers: Handlers::default(),
            config,
            faulted: HashSet::new(),
        }
    }

    /// Replace the request handlers.
    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentManager {
        &self.documents
    }

    pub fn table(&self) -> &PostponedTable {
        &self.table
    }

    /// Run the scheduler on its own named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Run until shutdown, or until the queue is closed and checking has
    /// nothing left to do.
    ///
    /// Blocks the calling thread, including while idle.
    pub fn run(mut self) {
        info!("Scheduler started");
        loop {
            match self.step() {
                Step::Dispatched | Step::Checked { .. } => {}
                Step::Idle => match self.queue.wait() {
                    Some(message) => {
                        if self.dispatch(message) == Step::Shutdown {
                            break;
                        }
                    }
                    None => break,
                },
                Step::Closed | Step::Shutdown => break,
            }
        }
        self.retire_all();
        info!("Scheduler stopped");
    }

    /// One scheduling cycle: dispatch a queued message if there is one,
    /// otherwise run one checking increment and wake what became ready.
    /// Checking continues after the queue closes until no work remains.
    pub fn step(&mut self) -> Step {
        match self.queue.try_pop() {
            Popped::Message(message) => self.dispatch(message),
            popped => match self.check_or_yield() {
                Some(ready) => Step::Checked {
                    woken: self.wake(&ready),
                },
                None if popped == Popped::Closed => Step::Closed,
                None => Step::Idle,
            },
        }
    }

    /// Dispatch one message synchronously.
    pub fn dispatch(&mut self, message: Incoming) -> Step {
        match message {
            Incoming::Request { id, request } => self.handle_request(id, request),
            Incoming::Rejected { id, rejected } => self.reject(id, rejected),
            Incoming::Notification(notification) => self.handle_notification(notification),
            Incoming::Cancel(id) => {
                cancel_by_client(&mut self.table, id, &self.replies);
            }
            Incoming::Shutdown => {
                info!("Shutdown requested");
                return Step::Shutdown;
            }
        }
        Step::Dispatched
    }

    fn handle_request(&mut self, id: RequestId, request: Request) {
        debug!("Request {} {}", id, request.method());
        let uri = request.uri().clone();

        if self.faulted.contains(&uri) {
            self.replies.fail(
                id,
                internal_error(format!("checking of {} failed; edit the document to retry", uri)),
            );
            return;
        }

        let Some(doc) = self.documents.get(&uri) else {
            warn!("{} {} targets unopened document {}", request.method(), id, uri);
            self.replies.fail(id, document_not_open(&uri));
            return;
        };

        let version = doc.version();
        let handlers = self.handlers;
        match classify(request.method(), || handlers.run(&request, doc)) {
            Outcome::Answered(value) => self.replies.answer(id, value),
            Outcome::Failed(error) => self.replies.fail(id, error),
            Outcome::Deferred(deferral) => self.postpone(id, request, uri, version, deferral),
        }
    }

    fn reject(&mut self, id: RequestId, rejected: Rejected) {
        match &rejected {
            Rejected::UnknownMethod { method } => debug!("No handler for {} {}", method, id),
            Rejected::Malformed { method, reason } => {
                warn!("Malformed {} {}: {}", method, id, reason)
            }
        }
        self.replies.fail(id, rejected.to_rpc_error());
    }

    fn postpone(
        &mut self,
        id: RequestId,
        request: Request,
        uri: Url,
        version: i32,
        deferral: Deferral,
    ) {
        if let (Deferral::At(position), true) = (deferral, self.config.supersede_postponed) {
            supersede(&mut self.table, &uri, position, &self.replies);
        }

        debug!("Postponing {} {} on {} ({:?})", request.method(), id, uri, deferral);
        let previous = self.table.insert(PendingEntry {
            id,
            uri,
            version,
            deferral,
            request,
        });
        if let Some(previous) = previous {
            warn!("Request id {} reused while pending; dropping earlier {}", id, previous.request.method());
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::DidOpen { uri, version, text } => {
                info!("Document opened: {} v{}", uri, version);
                if self.documents.contains(&uri) {
                    close_document(&mut self.table, &uri, &self.replies);
                }
                self.store(&uri, version, text);
            }
            Notification::DidChange { uri, version, text } => {
                let Some(current) = self.documents.version(&uri) else {
                    warn!("Change for unopened document {} ignored", uri);
                    return;
                };
                if version <= current {
                    let error = ServerError::StaleVersion {
                        uri,
                        received: version,
                        current,
                    };
                    warn!("Ignoring change: {}", error);
                    return;
                }
                debug!("Document changed: {} v{} -> v{}", uri, current, version);
                invalidate_document(&mut self.table, &uri, version, &self.replies);
                self.store(&uri, version, text);
            }
            Notification::DidClose { uri } => {
                info!("Document closed: {}", uri);
                close_document(&mut self.table, &uri, &self.replies);
                self.documents.remove(&uri);
                self.faulted.remove(&uri);
                self.replies.clear_diagnostics(&uri);
            }
            Notification::Configure(config) => {
                info!(
                    "Configuration updated: max document size {} bytes, {} sentences per increment, supersede {}",
                    config.max_document_size, config.sentences_per_increment, config.supersede_postponed
                );
                self.documents.set_max_document_size(config.max_document_size);
                self.config = config;
            }
        }
    }

    /// Store a new version. A rejected version closes the document: the
    /// previous version no longer matches what the client has.
    fn store(&mut self, uri: &Url, version: i32, text: String) {
        self.faulted.remove(uri);
        if let Err(e) = self.documents.open(uri, version, text) {
            close_document(&mut self.table, uri, &self.replies);
            self.documents.remove(uri);
            self.replies.clear_diagnostics(uri);
            self.replies
                .show_message(MessageType::WARNING, format!("{} not checked: {}", uri, e));
        }
    }

    /// Run one checking increment on the front document of the rotation.
    ///
    /// Returns `None` when there is nothing to check, otherwise the ids of
    /// postponed requests on that document that are now ready, in answer
    /// order.
    pub fn check_or_yield(&mut self) -> Option<Vec<RequestId>> {
        let uri = self.documents.next_to_check()?.clone();
        let budget = self.config.sentences_per_increment;
        let interrupt = self.queue.interrupt().clone();
        let check = self.handlers.check;
        let doc = self.documents.get_mut(&uri)?;

        let result = catch_unwind(AssertUnwindSafe(|| check(doc, &interrupt, budget)));
        let status = match result {
            Ok(status) => status,
            Err(_) => {
                error!("Checking panicked on {}; document removed from checking", uri);
                self.fault(&uri);
                return Some(Vec::new());
            }
        };

        debug!(
            "Checked {}/{} sentences of {} ({:?})",
            doc.checked_count(),
            doc.sentence_count(),
            uri,
            status
        );
        self.replies.progress(&uri, doc);
        if status.is_terminal() {
            self.replies.publish_diagnostics(&uri, doc);
            let version = doc.version();
            self.documents.finish(&uri);
            info!("Finished checking {} v{} ({:?})", uri, version, status);
        }

        let version = self.documents.version(&uri)?;
        Some(self.table.ready_ids(&uri, &status, version))
    }

    fn fault(&mut self, uri: &Url) {
        self.documents.finish(uri);
        self.faulted.insert(uri.clone());
        for id in self.table.pending_for(uri) {
            self.table.cancel(
                id,
                internal_error(format!("checking of {} failed", uri)),
                &self.replies,
            );
        }
    }

    /// Answer the postponed requests in `ids`, in order. Returns how many
    /// were answered.
    pub fn wake(&mut self, ids: &[RequestId]) -> usize {
        let mut answered = 0;
        for entry in self.table.wake(ids) {
            let Some(doc) = self.documents.get(&entry.uri) else {
                self.replies.fail(entry.id, document_not_open(&entry.uri));
                continue;
            };

            let handlers = self.handlers;
            let outcome = classify(entry.request.method(), || handlers.run(&entry.request, doc));
            match outcome {
                Outcome::Deferred(deferral) => {
                    debug!("{} still not ready, postponing again", entry.id);
                    self.table.insert(PendingEntry { deferral, ..entry });
                }
                Outcome::Answered(value) => {
                    debug!("Woke {} {}", entry.request.method(), entry.id);
                    self.replies.answer(entry.id, value);
                    answered += 1;
                }
                Outcome::Failed(error) => {
                    self.replies.fail(entry.id, error);
                    answered += 1;
                }
            }
        }
        answered
    }

    /// Reply to everything still pending before the loop exits.
    fn retire_all(&mut self) {
        let ids = self.table.ids();
        if !ids.is_empty() {
            info!("Retiring {} postponed request(s)", ids.len());
        }
        for id in ids {
            self.table.cancel(id, shutting_down(), &self.replies);
        }
    }
}
