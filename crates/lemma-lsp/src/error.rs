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

//! Server errors and the JSON-RPC error replies built from them.
//!
//! Every retired request gets exactly one reply; the constructors below fix
//! the code used for each way a request can end without an answer.

use crate::message::RequestId;
use thiserror::Error;
use tower_lsp::jsonrpc::{Error as RpcError, ErrorCode};
use tower_lsp::lsp_types::Url;

/// Errors raised by the server outside of request handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("document too large: {size} bytes exceeds maximum of {max} bytes")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("document not open: {0}")]
    DocumentNotOpen(Url),

    #[error("out-of-order version {received} for {uri} (current {current})")]
    StaleVersion { uri: Url, received: i32, current: i32 },

    #[error("request queue closed")]
    QueueClosed,

    #[error("scheduler stopped before replying to {0}")]
    NoReply(RequestId),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// Reply sent to the client when this error ends a request.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::DocumentNotOpen(uri) => document_not_open(uri),
            Self::StaleVersion { .. } => stale(),
            Self::Json(e) => invalid_request(e.to_string()),
            _ => internal_error(self.to_string()),
        }
    }
}

fn rpc_error(code: ErrorCode, message: impl Into<String>) -> RpcError {
    RpcError {
        code,
        message: message.into().into(),
        data: None,
    }
}

/// Malformed request parameters.
pub fn invalid_request(reason: impl Into<String>) -> RpcError {
    rpc_error(ErrorCode::InvalidRequest, reason)
}

pub fn method_not_found(method: &str) -> RpcError {
    rpc_error(ErrorCode::MethodNotFound, format!("method not found: {}", method))
}

pub fn document_not_open(uri: &Url) -> RpcError {
    rpc_error(ErrorCode::InvalidParams, format!("document not open: {}", uri))
}

/// Explicit cancellation from the client.
pub fn cancelled() -> RpcError {
    rpc_error(ErrorCode::RequestCancelled, "cancelled by client")
}

/// The document the request targeted has changed.
pub fn stale() -> RpcError {
    rpc_error(ErrorCode::ContentModified, "request is stale")
}

/// A newer request on the same document made this one obsolete.
pub fn superseded() -> RpcError {
    rpc_error(ErrorCode::ContentModified, "request superseded by a newer request")
}

/// The document was closed while the request was waiting.
pub fn document_closed() -> RpcError {
    rpc_error(ErrorCode::ContentModified, "document closed")
}

/// The scheduler stopped while the request was waiting.
pub fn shutting_down() -> RpcError {
    rpc_error(ErrorCode::RequestCancelled, "server shutting down")
}

pub fn internal_error(message: impl Into<String>) -> RpcError {
    rpc_error(ErrorCode::InternalError, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(cancelled().code, ErrorCode::RequestCancelled);
        assert_eq!(stale().code, ErrorCode::ContentModified);
        assert_eq!(superseded().code, ErrorCode::ContentModified);
        assert_eq!(invalid_request("bad").code, ErrorCode::InvalidRequest);
        assert_eq!(method_not_found("x/y").message, "method not found: x/y");
    }

    #[test]
    fn test_server_error_mapping() {
        let uri = Url::parse("file:///a.v").unwrap();
        assert_eq!(
            ServerError::DocumentNotOpen(uri).to_rpc_error().code,
            ErrorCode::InvalidParams
        );
        assert_eq!(
            ServerError::QueueClosed.to_rpc_error().code,
            ErrorCode::InternalError
        );
    }
}
