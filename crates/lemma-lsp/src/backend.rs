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

//! LSP backend implementation.
//!
//! The backend is the transport side of the server. It never touches
//! documents: every notification and request is turned into an
//! [`Incoming`] message and submitted to the request queue, and the
//! scheduler thread does the rest.
//!
//! Replies come back on the [`Outgoing`] stream. A routing task forwards
//! responses to the request futures waiting for them, and diagnostics,
//! progress and messages to the client, in the order the scheduler produced
//! them.
//!
//! tower-lsp handles `$/cancelRequest` itself by dropping the request
//! future. Each request future holds a guard that, when dropped before a
//! reply arrived, submits [`Incoming::Cancel`] so the scheduler can retire
//! the postponed request.

use crate::config::ServerConfig;
use crate::constants::METHOD_GOALS;
use crate::error::ServerError;
use crate::message::{FileProgress, Incoming, Notification, Outgoing, Request, RequestId};
use crate::queue::{request_queue, QueueSender};
use crate::reply::Replies;
use crate::scheduler::Scheduler;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

type ReplySlot = oneshot::Sender<Result<Value>>;

/// Request futures waiting for a reply, by internal request id.
type PendingReplies = Arc<DashMap<RequestId, ReplySlot>>;

/// Lemma Language Server backend.
pub struct LemmaLanguageServer {
    /// LSP client connection.
    client: Client,
    /// Producer side of the scheduler's request queue.
    queue: QueueSender,
    pending: PendingReplies,
    next_id: AtomicU64,
    config: ServerConfig,
    /// Scheduler thread, joined on shutdown.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LemmaLanguageServer {
    /// Create a new language server with default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, ServerConfig::default())
    }

    /// Create a new language server with custom configuration.
    ///
    /// Starts the scheduler thread and the reply routing task. Must be
    /// called from within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lemma_lsp::{LemmaLanguageServer, ServerConfig};
    /// use tower_lsp::Client;
    ///
    /// fn create_server(client: Client) -> LemmaLanguageServer {
    ///     let config = ServerConfig {
    ///         sentences_per_increment: 4,
    ///         ..ServerConfig::default()
    ///     };
    ///     LemmaLanguageServer::with_config(client, config)
    /// }
    /// ```
    pub fn with_config(client: Client, config: ServerConfig) -> Self {
        let (queue, receiver) = request_queue();
        let (replies, outgoing) = Replies::channel();
        let pending: PendingReplies = Arc::new(DashMap::new());

        let worker = match Scheduler::new(receiver, replies, config.clone()).spawn() {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to start scheduler thread: {}", e);
                None
            }
        };
        tokio::spawn(route_outgoing(client.clone(), outgoing, Arc::clone(&pending)));

        Self {
            client,
            queue,
            pending,
            next_id: AtomicU64::new(1),
            config,
            worker: Mutex::new(worker),
        }
    }

    /// Number of requests waiting for a reply from the scheduler.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.queue.submit(Incoming::Notification(notification)) {
            warn!("Notification dropped: {}", e);
        }
    }

    /// Submit a request and wait for the scheduler's reply.
    async fn request(&self, request: Request) -> Result<Value> {
        self.call(|id| Incoming::Request { id, request }).await
    }

    /// Submit the message built by `message` under a fresh id and wait for
    /// the scheduler's reply to that id.
    async fn call(&self, message: impl FnOnce(RequestId) -> Incoming) -> Result<Value> {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let mut guard = CancelOnDrop {
            id,
            queue: self.queue.clone(),
            pending: Arc::clone(&self.pending),
            armed: true,
        };
        if let Err(e) = self.queue.submit(message(id)) {
            guard.disarm();
            self.pending.remove(&id);
            return Err(e.to_rpc_error());
        }

        let reply = rx.await;
        guard.disarm();
        reply.unwrap_or_else(|_| Err(ServerError::NoReply(id).to_rpc_error()))
    }

    /// Handle the `proof/goals` request.
    ///
    /// Parameters are decoded here rather than by tower-lsp, so malformed
    /// ones are retired by the scheduler with an invalid-request error.
    pub async fn goals(&self, params: Value) -> Result<Value> {
        match Request::decode(METHOD_GOALS, params) {
            Ok(request) => self.request(request).await,
            Err(rejected) => self.call(|id| Incoming::Rejected { id, rejected }).await,
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ServerError::from(e).to_rpc_error())
}

/// Cancels the scheduler-side request when a request future is dropped
/// before its reply arrived.
struct CancelOnDrop {
    id: RequestId,
    queue: QueueSender,
    pending: PendingReplies,
    armed: bool,
}

impl CancelOnDrop {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Request {} abandoned by client", self.id);
        self.pending.remove(&self.id);
        if let Err(e) = self.queue.cancel(self.id) {
            debug!("Could not cancel {}: {}", self.id, e);
        }
    }
}

/// Forward the scheduler's output, in order, until the scheduler stops.
async fn route_outgoing(
    client: Client,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    pending: PendingReplies,
) {
    while let Some(message) = outgoing.recv().await {
        match message {
            Outgoing::Response { id, result } => match pending.remove(&id) {
                Some((_, slot)) => {
                    if slot.send(result).is_err() {
                        debug!("Reply to {} arrived after the request was dropped", id);
                    }
                }
                None => debug!("No waiting request for reply {}", id),
            },
            Outgoing::Diagnostics {
                uri,
                version,
                diagnostics,
            } => {
                debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
                client.publish_diagnostics(uri, diagnostics, version).await;
            }
            Outgoing::Progress(params) => {
                client.send_notification::<FileProgress>(params).await;
            }
            Outgoing::ShowMessage { typ, message } => {
                client.show_message(typ, message).await;
            }
        }
    }
    debug!("Reply stream closed");
}

#[tower_lsp::async_trait]
impl LanguageServer for LemmaLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Lemma Language Server initializing");

        if let Some(options) = params.initialization_options {
            match self.config.merged(options) {
                Ok(config) => self.notify(Notification::Configure(config)),
                Err(e) => warn!("Ignoring invalid initializationOptions: {}", e),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![" ".to_string()]),
                    ..Default::default()
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "lemma-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Lemma Language Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Lemma Language Server shutting down");
        if let Err(e) = self.queue.submit(Incoming::Shutdown) {
            debug!("Scheduler already stopped: {}", e);
        }

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => debug!("Scheduler thread joined"),
                _ => error!("Scheduler thread panicked"),
            }
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!("Document opened: {} ({} bytes)", doc.uri, doc.text.len());
        self.notify(Notification::DidOpen {
            uri: doc.uri,
            version: doc.version,
            text: doc.text,
        });
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            warn!("Empty change for {} v{}", uri, version);
            return;
        };
        self.notify(Notification::DidChange {
            uri,
            version,
            text: change.text,
        });
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.notify(Notification::DidClose {
            uri: params.text_document.uri,
        });
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let target = params.text_document_position_params;
        let value = self
            .request(Request::Hover {
                uri: target.text_document.uri,
                position: target.position,
            })
            .await?;
        decode(value)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let target = params.text_document_position;
        let value = self
            .request(Request::Completion {
                uri: target.text_document.uri,
                position: target.position,
            })
            .await?;
        decode(value)
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let value = self
            .request(Request::DocumentSymbol {
                uri: params.text_document.uri,
            })
            .await?;
        decode(value)
    }
}
