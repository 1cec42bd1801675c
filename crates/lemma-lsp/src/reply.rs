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

//! The ordered reply stream from the scheduler to the transport.

use crate::constants::DIAGNOSTIC_SOURCE;
use crate::message::{FileProgressParams, Outgoing, RequestId};
use crate::utils::{to_lsp_position, to_lsp_range};
use lemma_core::{Document, Severity};
use serde_json::Value;
use tokio::sync::mpsc;
use tower_lsp::jsonrpc::Error as RpcError;
use tower_lsp::lsp_types::{self, DiagnosticSeverity, MessageType, Url, VersionedTextDocumentIdentifier};
use tracing::debug;

/// Sending half of the reply stream.
///
/// Sends never block. If the transport has gone away the message is dropped
/// with a debug log; the scheduler keeps running until its queue closes.
#[derive(Debug, Clone)]
pub struct Replies {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl Replies {
    pub fn new(tx: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self { tx }
    }

    /// Create a reply stream together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, message: Outgoing) {
        if self.tx.send(message).is_err() {
            debug!("Reply stream closed, dropping outgoing message");
        }
    }

    pub fn respond(&self, id: RequestId, result: Result<Value, RpcError>) {
        self.send(Outgoing::Response { id, result });
    }

    pub fn answer(&self, id: RequestId, value: Value) {
        self.respond(id, Ok(value));
    }

    pub fn fail(&self, id: RequestId, error: RpcError) {
        self.respond(id, Err(error));
    }

    /// Publish every diagnostic of `doc`.
    pub fn publish_diagnostics(&self, uri: &Url, doc: &Document) {
        let diagnostics = doc
            .diagnostics()
            .iter()
            .map(|diagnostic| to_lsp_diagnostic(doc.text(), diagnostic))
            .collect();
        self.send(Outgoing::Diagnostics {
            uri: uri.clone(),
            version: Some(doc.version()),
            diagnostics,
        });
    }

    /// Clear diagnostics of a closed document.
    pub fn clear_diagnostics(&self, uri: &Url) {
        self.send(Outgoing::Diagnostics {
            uri: uri.clone(),
            version: None,
            diagnostics: Vec::new(),
        });
    }

    pub fn progress(&self, uri: &Url, doc: &Document) {
        self.send(Outgoing::Progress(FileProgressParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version: doc.version(),
            },
            checked: doc.checked_count(),
            total: doc.sentence_count(),
            frontier: to_lsp_position(doc.text(), doc.completion().frontier()),
        }));
    }

    pub fn show_message(&self, typ: MessageType, message: impl Into<String>) {
        self.send(Outgoing::ShowMessage {
            typ,
            message: message.into(),
        });
    }
}

fn to_lsp_diagnostic(text: &str, diagnostic: &lemma_core::Diagnostic) -> lsp_types::Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
    };
    lsp_types::Diagnostic {
        range: to_lsp_range(text, diagnostic.range),
        severity: Some(severity),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_preserve_order() {
        let (replies, mut rx) = Replies::channel();
        replies.answer(RequestId(1), Value::Null);
        replies.fail(RequestId(2), crate::error::cancelled());

        match rx.try_recv().unwrap() {
            Outgoing::Response { id, result } => {
                assert_eq!(id, RequestId(1));
                assert!(result.is_ok());
            }
            other => panic!("unexpected {:?}", other),
        }
        match rx.try_recv().unwrap() {
            Outgoing::Response { id, result } => {
                assert_eq!(id, RequestId(2));
                assert!(result.is_err());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_diagnostics_conversion() {
        let (replies, mut rx) = Replies::channel();
        let uri = Url::parse("file:///bad.v").unwrap();
        let mut doc = Document::new(uri.as_str(), 3, "Qed.\n");
        doc.check_all();
        replies.publish_diagnostics(&uri, &doc);

        match rx.try_recv().unwrap() {
            Outgoing::Diagnostics {
                version,
                diagnostics,
                ..
            } => {
                assert_eq!(version, Some(3));
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
                assert_eq!(diagnostics[0].source.as_deref(), Some("lemma"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_positions_sent_in_utf16() {
        let (replies, mut rx) = Replies::channel();
        let uri = Url::parse("file:///forall.v").unwrap();
        let mut doc = Document::new(uri.as_str(), 1, "Check ∀.\n");
        doc.check_all();
        replies.progress(&uri, &doc);
        replies.publish_diagnostics(&uri, &doc);

        match rx.try_recv().unwrap() {
            Outgoing::Progress(params) => {
                assert_eq!(params.frontier, lsp_types::Position::new(0, 8));
            }
            other => panic!("unexpected {:?}", other),
        }
        match rx.try_recv().unwrap() {
            Outgoing::Diagnostics { diagnostics, .. } => {
                assert_eq!(diagnostics[0].range.end, lsp_types::Position::new(0, 8));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_closed_stream_does_not_panic() {
        let (replies, rx) = Replies::channel();
        drop(rx);
        replies.answer(RequestId(7), Value::Null);
    }
}
