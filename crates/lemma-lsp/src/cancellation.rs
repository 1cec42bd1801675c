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

//! Cancellation of postponed requests.
//!
//! Requests leave the postponed table in exactly one of two ways: they are
//! woken and answered, or they are cancelled here with an error reply. Each
//! function below removes the affected entries before replying, so a request
//! is never answered twice and cancelling an already-finished request is a
//! silent no-op.

use crate::error::{cancelled, document_closed, stale, superseded};
use crate::message::RequestId;
use crate::postponed::PostponedTable;
use crate::reply::Replies;
use lemma_core::Position;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

/// Client-initiated cancellation (`$/cancelRequest`).
///
/// Returns whether a postponed request was cancelled. Requests that were
/// already answered, or never postponed, are ignored.
pub fn cancel_by_client(table: &mut PostponedTable, id: RequestId, replies: &Replies) -> bool {
    let removed = table.cancel(id, cancelled(), replies);
    if !removed {
        debug!("Ignoring cancellation of {}: not pending", id);
    }
    removed
}

/// Cancel every request on `uri` issued against a version older than
/// `new_version`. Called before the new version replaces the old one.
pub fn invalidate_document(
    table: &mut PostponedTable,
    uri: &Url,
    new_version: i32,
    replies: &Replies,
) -> usize {
    let ids = table.stale_for(uri, new_version);
    if !ids.is_empty() {
        warn!(
            "Cancelling {} stale request(s) on {} (now version {})",
            ids.len(),
            uri,
            new_version
        );
    }
    cancel_all(table, &ids, replies, stale)
}

/// Cancel requests on `uri` waiting for a position after `position`: a newer
/// request at `position` means the user has moved on.
pub fn supersede(
    table: &mut PostponedTable,
    uri: &Url,
    position: Position,
    replies: &Replies,
) -> usize {
    let ids = table.superseded_by(uri, position);
    if !ids.is_empty() {
        warn!(
            "{} request(s) on {} superseded by a request at {}",
            ids.len(),
            uri,
            position
        );
    }
    cancel_all(table, &ids, replies, superseded)
}

/// Cancel every request on a document that is being closed.
pub fn close_document(table: &mut PostponedTable, uri: &Url, replies: &Replies) -> usize {
    let ids = table.pending_for(uri);
    if !ids.is_empty() {
        warn!("Cancelling {} request(s) on closed {}", ids.len(), uri);
    }
    cancel_all(table, &ids, replies, document_closed)
}

fn cancel_all(
    table: &mut PostponedTable,
    ids: &[RequestId],
    replies: &Replies,
    error: fn() -> tower_lsp::jsonrpc::Error,
) -> usize {
    ids.iter()
        .filter(|id| table.cancel(**id, error(), replies))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Outgoing, Request};
    use crate::outcome::Deferral;
    use crate::postponed::PendingEntry;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tower_lsp::jsonrpc::ErrorCode;
    use tower_lsp::lsp_types::Position as LspPosition;

    fn uri() -> Url {
        Url::parse("file:///proof.v").unwrap()
    }

    fn hover(id: u64, version: i32, line: u32) -> PendingEntry {
        let position = Position::new(line, 0);
        PendingEntry {
            id: RequestId(id),
            uri: uri(),
            version,
            deferral: Deferral::At(position),
            request: Request::Hover {
                uri: uri(),
                position: LspPosition::new(line, 0),
            },
        }
    }

    fn errors(rx: &mut UnboundedReceiver<Outgoing>) -> Vec<(RequestId, ErrorCode)> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Outgoing::Response {
                id,
                result: Err(error),
            } = message
            {
                out.push((id, error.code));
            }
        }
        out
    }

    #[test]
    fn test_cancel_by_client() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(hover(1, 1, 8));

        assert!(cancel_by_client(&mut table, RequestId(1), &replies));
        assert!(table.is_empty());
        assert_eq!(errors(&mut rx), vec![(RequestId(1), ErrorCode::RequestCancelled)]);
    }

    #[test]
    fn test_cancel_unknown_id_is_noop() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(hover(1, 1, 8));

        assert!(!cancel_by_client(&mut table, RequestId(42), &replies));
        assert_eq!(table.len(), 1);
        assert!(errors(&mut rx).is_empty());
    }

    #[test]
    fn test_invalidate_only_older_versions() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(hover(1, 1, 8));
        table.insert(hover(2, 2, 9));

        assert_eq!(invalidate_document(&mut table, &uri(), 2, &replies), 1);
        assert!(table.contains(RequestId(2)));
        assert_eq!(errors(&mut rx), vec![(RequestId(1), ErrorCode::ContentModified)]);
    }

    #[test]
    fn test_supersede_later_positions() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(hover(1, 1, 5));
        table.insert(hover(2, 1, 2));

        assert_eq!(supersede(&mut table, &uri(), Position::new(3, 0), &replies), 1);
        assert!(table.contains(RequestId(2)));
        assert_eq!(errors(&mut rx), vec![(RequestId(1), ErrorCode::ContentModified)]);
    }

    #[test]
    fn test_close_document_cancels_everything() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(hover(1, 1, 5));
        table.insert(hover(2, 3, 2));

        assert_eq!(close_document(&mut table, &uri(), &replies), 2);
        assert!(table.is_empty());
        assert_eq!(errors(&mut rx).len(), 2);
    }
}
