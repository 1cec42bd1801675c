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

//! Requests waiting for checking to catch up.
//!
//! The table owns every postponed request from the moment it is deferred
//! until it is woken, cancelled or superseded. Entries are plain descriptors
//! (target document, version, position, request) rather than closures, so
//! waking an entry simply re-runs the handler for its [`Request`].
//!
//! Besides the id-keyed map, the table keeps a per-document pending set so
//! that edits and wake-ups only visit the entries of the affected document.

use crate::message::{Request, RequestId};
use crate::outcome::Deferral;
use crate::readiness::ready;
use crate::reply::Replies;
use lemma_core::{Completion, Position};
use std::collections::{HashMap, HashSet};
use tower_lsp::jsonrpc::Error as RpcError;
use tower_lsp::lsp_types::Url;
use tracing::debug;

/// A postponed request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub id: RequestId,
    pub uri: Url,
    /// Document version the request was issued against.
    pub version: i32,
    pub deferral: Deferral,
    pub request: Request,
}

impl PendingEntry {
    pub fn position(&self) -> Option<Position> {
        self.deferral.position()
    }
}

/// Postponed requests keyed by identity, indexed by document.
#[derive(Debug, Default)]
pub struct PostponedTable {
    entries: HashMap<RequestId, PendingEntry>,
    by_document: HashMap<Url, HashSet<RequestId>>,
}

impl PostponedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: RequestId) -> Option<&PendingEntry> {
        self.entries.get(&id)
    }

    /// Insert an entry, returning the one it replaced (ids are unique per
    /// live request, so a replacement indicates a reused identity).
    pub fn insert(&mut self, entry: PendingEntry) -> Option<PendingEntry> {
        let previous = self.remove(entry.id);
        self.by_document
            .entry(entry.uri.clone())
            .or_default()
            .insert(entry.id);
        self.entries.insert(entry.id, entry);
        previous
    }

    /// Remove an entry. Absent ids are not an error: the request was already
    /// served or cancelled.
    pub fn remove(&mut self, id: RequestId) -> Option<PendingEntry> {
        let entry = self.entries.remove(&id)?;
        if let Some(ids) = self.by_document.get_mut(&entry.uri) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_document.remove(&entry.uri);
            }
        }
        Some(entry)
    }

    /// Remove an entry and reply with `error` in its place. Returns whether
    /// an entry was present; absent ids produce no reply.
    pub fn cancel(&mut self, id: RequestId, error: RpcError, replies: &Replies) -> bool {
        match self.remove(id) {
            Some(entry) => {
                debug!("Cancelling postponed {} {}: {}", entry.request.method(), id, error.message);
                replies.fail(id, error);
                true
            }
            None => false,
        }
    }

    /// Remove the entries in `ids` that are still present, in the given order.
    pub fn wake(&mut self, ids: &[RequestId]) -> Vec<PendingEntry> {
        ids.iter().filter_map(|id| self.remove(*id)).collect()
    }

    fn document_entries<'a>(&'a self, uri: &Url) -> impl Iterator<Item = &'a PendingEntry> + 'a {
        self.by_document
            .get(uri)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.entries.get(id))
    }

    /// Every pending id, in ascending order.
    pub fn ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Ids pending on `uri`, in ascending order.
    pub fn pending_for(&self, uri: &Url) -> Vec<RequestId> {
        let mut ids: Vec<_> = self.document_entries(uri).map(|entry| entry.id).collect();
        ids.sort();
        ids
    }

    /// Entries on `uri` that are answerable under `status`, ordered by
    /// position (whole-document requests last), then by arrival.
    pub fn ready_ids(&self, uri: &Url, status: &Completion, current_version: i32) -> Vec<RequestId> {
        let mut ready_entries: Vec<_> = self
            .document_entries(uri)
            .filter(|entry| ready(status, entry.position(), Some(entry.version), current_version))
            .collect();
        ready_entries.sort_by_key(|entry| (entry.position().is_none(), entry.position(), entry.id));
        ready_entries.into_iter().map(|entry| entry.id).collect()
    }

    /// Position-deferred entries on `uri` targeting a position strictly after `position`.
    pub fn superseded_by(&self, uri: &Url, position: Position) -> Vec<RequestId> {
        let mut ids: Vec<_> = self
            .document_entries(uri)
            .filter(|entry| matches!(entry.deferral, Deferral::At(target) if target > position))
            .map(|entry| entry.id)
            .collect();
        ids.sort();
        ids
    }

    /// Entries on `uri` issued against a version older than `new_version`.
    pub fn stale_for(&self, uri: &Url, new_version: i32) -> Vec<RequestId> {
        let mut ids: Vec<_> = self
            .document_entries(uri)
            .filter(|entry| entry.version < new_version)
            .map(|entry| entry.id)
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Outgoing;
    use lemma_core::Range;
    use tower_lsp::lsp_types::Position as LspPosition;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///{}.v", name)).unwrap()
    }

    fn entry(id: u64, doc: &str, version: i32, deferral: Deferral) -> PendingEntry {
        let uri = uri(doc);
        let request = match deferral {
            Deferral::At(position) => Request::Hover {
                uri: uri.clone(),
                position: LspPosition::new(position.line, position.character),
            },
            Deferral::UntilDone => Request::DocumentSymbol { uri: uri.clone() },
        };
        PendingEntry {
            id: RequestId(id),
            uri,
            version,
            deferral,
            request,
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut table = PostponedTable::new();
        assert!(table.insert(entry(1, "a", 1, Deferral::At(Position::new(3, 0)))).is_none());
        assert!(table.contains(RequestId(1)));
        assert_eq!(table.pending_for(&uri("a")), vec![RequestId(1)]);

        assert!(table.remove(RequestId(1)).is_some());
        assert!(table.remove(RequestId(1)).is_none());
        assert!(table.is_empty());
        assert!(table.pending_for(&uri("a")).is_empty());
    }

    #[test]
    fn test_insert_overwrites_and_moves_document() {
        let mut table = PostponedTable::new();
        table.insert(entry(1, "a", 1, Deferral::UntilDone));
        let previous = table.insert(entry(1, "b", 1, Deferral::UntilDone));
        assert_eq!(previous.map(|e| e.uri), Some(uri("a")));
        assert_eq!(table.len(), 1);
        assert!(table.pending_for(&uri("a")).is_empty());
        assert_eq!(table.pending_for(&uri("b")), vec![RequestId(1)]);
    }

    #[test]
    fn test_cancel_replies_once() {
        let (replies, mut rx) = Replies::channel();
        let mut table = PostponedTable::new();
        table.insert(entry(4, "a", 1, Deferral::UntilDone));

        assert!(table.cancel(RequestId(4), crate::error::cancelled(), &replies));
        assert!(!table.cancel(RequestId(4), crate::error::cancelled(), &replies));

        assert!(matches!(
            rx.try_recv(),
            Ok(Outgoing::Response { id: RequestId(4), result: Err(_) })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ready_ids_ordering() {
        let mut table = PostponedTable::new();
        table.insert(entry(1, "a", 1, Deferral::UntilDone));
        table.insert(entry(2, "a", 1, Deferral::At(Position::new(7, 0))));
        table.insert(entry(3, "a", 1, Deferral::At(Position::new(2, 0))));
        table.insert(entry(4, "b", 1, Deferral::At(Position::new(0, 0))));

        let stopped = Completion::Stopped {
            range: Range::new(Position::start(), Position::new(5, 0)),
        };
        assert_eq!(table.ready_ids(&uri("a"), &stopped, 1), vec![RequestId(3)]);

        let done = Completion::Done {
            range: Range::default(),
        };
        assert_eq!(
            table.ready_ids(&uri("a"), &done, 1),
            vec![RequestId(3), RequestId(2), RequestId(1)]
        );
    }

    #[test]
    fn test_superseded_and_stale_are_per_document() {
        let mut table = PostponedTable::new();
        table.insert(entry(1, "a", 1, Deferral::At(Position::new(5, 0))));
        table.insert(entry(2, "a", 2, Deferral::At(Position::new(9, 0))));
        table.insert(entry(3, "a", 1, Deferral::UntilDone));
        table.insert(entry(4, "b", 1, Deferral::At(Position::new(8, 0))));

        assert_eq!(
            table.superseded_by(&uri("a"), Position::new(5, 0)),
            vec![RequestId(2)]
        );
        assert_eq!(
            table.stale_for(&uri("a"), 2),
            vec![RequestId(1), RequestId(3)]
        );
        assert!(table.stale_for(&uri("c"), 10).is_empty());
    }

    #[test]
    fn test_wake_skips_missing() {
        let mut table = PostponedTable::new();
        table.insert(entry(1, "a", 1, Deferral::UntilDone));
        let woken = table.wake(&[RequestId(9), RequestId(1)]);
        assert_eq!(woken.len(), 1);
        assert_eq!(woken[0].id, RequestId(1));
        assert!(table.is_empty());
    }
}
