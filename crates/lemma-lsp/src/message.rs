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

//! Messages exchanged between the transport and the scheduler.
//!
//! Incoming requests are decoded once, at the transport boundary, into a
//! closed set of [`Request`] variants. Methods the server does not know and
//! parameters that fail to decode become a [`Rejected`] request, which the
//! scheduler retires in arrival order like any other request.
//!
//! Request positions stay in the client's UTF-16 columns until a handler
//! runs against the document text.

use crate::config::ServerConfig;
use crate::constants::{
    METHOD_COMPLETION, METHOD_DOCUMENT_SYMBOL, METHOD_FILE_PROGRESS, METHOD_GOALS, METHOD_HOVER,
};
use crate::error::{invalid_request, method_not_found};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tower_lsp::jsonrpc::Error as RpcError;
use tower_lsp::lsp_types::{
    self, CompletionParams, DocumentSymbolParams, HoverParams, MessageType, Position,
    TextDocumentIdentifier, Url, VersionedTextDocumentIdentifier,
};

/// Identity of an in-flight request. Unique while the request is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters of the `proof/goals` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsParams {
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
}

/// Checking progress of one document, sent after every increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProgressParams {
    pub text_document: VersionedTextDocumentIdentifier,
    /// Sentences checked so far.
    pub checked: usize,
    pub total: usize,
    /// End of the checked region.
    pub frontier: Position,
}

/// The `$/lemma/fileProgress` notification.
pub enum FileProgress {}

impl lsp_types::notification::Notification for FileProgress {
    type Params = FileProgressParams;
    const METHOD: &'static str = METHOD_FILE_PROGRESS;
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Hover { uri: Url, position: Position },
    Goals { uri: Url, position: Position },
    Completion { uri: Url, position: Position },
    DocumentSymbol { uri: Url },
}

/// A request that never reaches a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejected {
    /// A method this server does not implement.
    UnknownMethod { method: String },
    /// A known method whose parameters failed to decode.
    Malformed { method: String, reason: String },
}

impl Rejected {
    pub fn method(&self) -> &str {
        match self {
            Self::UnknownMethod { method } | Self::Malformed { method, .. } => method,
        }
    }

    /// Reply that retires the request.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::UnknownMethod { method } => method_not_found(method),
            Self::Malformed { reason, .. } => invalid_request(reason.clone()),
        }
    }
}

fn decode_params<P: DeserializeOwned>(method: &str, params: Value) -> Result<P, Rejected> {
    serde_json::from_value(params).map_err(|e| Rejected::Malformed {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

impl Request {
    /// Decode a request from its method name and raw parameters.
    pub fn decode(method: &str, params: Value) -> Result<Self, Rejected> {
        match method {
            METHOD_HOVER => decode_params::<HoverParams>(method, params).map(|p| Self::Hover {
                uri: p.text_document_position_params.text_document.uri,
                position: p.text_document_position_params.position,
            }),
            METHOD_GOALS => decode_params::<GoalsParams>(method, params).map(|p| Self::Goals {
                uri: p.text_document.uri,
                position: p.position,
            }),
            METHOD_COMPLETION => {
                decode_params::<CompletionParams>(method, params).map(|p| Self::Completion {
                    uri: p.text_document_position.text_document.uri,
                    position: p.text_document_position.position,
                })
            }
            METHOD_DOCUMENT_SYMBOL => decode_params::<DocumentSymbolParams>(method, params)
                .map(|p| Self::DocumentSymbol {
                    uri: p.text_document.uri,
                }),
            _ => Err(Rejected::UnknownMethod {
                method: method.to_string(),
            }),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::Hover { .. } => METHOD_HOVER,
            Self::Goals { .. } => METHOD_GOALS,
            Self::Completion { .. } => METHOD_COMPLETION,
            Self::DocumentSymbol { .. } => METHOD_DOCUMENT_SYMBOL,
        }
    }

    /// Target document.
    pub fn uri(&self) -> &Url {
        match self {
            Self::Hover { uri, .. }
            | Self::Goals { uri, .. }
            | Self::Completion { uri, .. }
            | Self::DocumentSymbol { uri } => uri,
        }
    }
}

/// Document lifecycle and settings notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    DidOpen { uri: Url, version: i32, text: String },
    /// Full-text change carrying the client's new version.
    DidChange { uri: Url, version: i32, text: String },
    DidClose { uri: Url },
    Configure(ServerConfig),
}

/// Everything the transport hands to the scheduler, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request { id: RequestId, request: Request },
    /// A request retired without running a handler.
    Rejected { id: RequestId, rejected: Rejected },
    Notification(Notification),
    /// Cancel the request with this identity, if it is still waiting.
    Cancel(RequestId),
    /// Stop the scheduler loop.
    Shutdown,
}

/// Everything the scheduler sends back, in the order it was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Response {
        id: RequestId,
        result: Result<Value, RpcError>,
    },
    Diagnostics {
        uri: Url,
        version: Option<i32>,
        diagnostics: Vec<lsp_types::Diagnostic>,
    },
    Progress(FileProgressParams),
    ShowMessage {
        typ: MessageType,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tower_lsp::jsonrpc::ErrorCode;

    fn uri() -> Url {
        Url::parse("file:///proof.v").unwrap()
    }

    #[test]
    fn test_decode_hover() {
        let params = json!({
            "textDocument": { "uri": "file:///proof.v" },
            "position": { "line": 4, "character": 2 }
        });
        assert_eq!(
            Request::decode(METHOD_HOVER, params),
            Ok(Request::Hover {
                uri: uri(),
                position: Position::new(4, 2)
            })
        );
    }

    #[test]
    fn test_decode_goals_and_symbols() {
        let goals = Request::decode(
            METHOD_GOALS,
            json!({ "textDocument": { "uri": "file:///proof.v" }, "position": { "line": 1, "character": 0 } }),
        )
        .unwrap();
        assert_eq!(
            goals,
            Request::Goals {
                uri: uri(),
                position: Position::new(1, 0)
            }
        );
        assert_eq!(goals.method(), METHOD_GOALS);

        let symbols = Request::decode(
            METHOD_DOCUMENT_SYMBOL,
            json!({ "textDocument": { "uri": "file:///proof.v" } }),
        )
        .unwrap();
        assert_eq!(symbols.uri(), &uri());
    }

    #[test]
    fn test_decode_unknown_method() {
        let rejected = Request::decode("textDocument/rename", json!({})).unwrap_err();
        assert_eq!(rejected.method(), "textDocument/rename");
        assert_eq!(rejected.to_rpc_error().code, ErrorCode::MethodNotFound);
    }

    #[test]
    fn test_decode_malformed_params() {
        let rejected = Request::decode(METHOD_GOALS, json!({ "position": "nowhere" })).unwrap_err();
        assert!(matches!(rejected, Rejected::Malformed { ref method, .. } if method == METHOD_GOALS));
        assert_eq!(rejected.to_rpc_error().code, ErrorCode::InvalidRequest);
    }
}
