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

//! Document storage and checking rotation.
//!
//! This module owns every open document together with its checking progress.
//! It lives on the scheduler thread, so it needs no locking.
//!
//! # Responsibilities
//!
//! - Document storage and retrieval
//! - Document size limit enforcement
//! - Choosing which document to check next
//!
//! # Rotation
//!
//! Documents that still have sentences to check are kept in a rotation. The
//! most recently opened or edited document moves to the front, so checking
//! follows the user's focus. A document leaves the rotation once its checking
//! reaches a terminal state (done or failed) and re-enters it on the next edit.

use crate::error::ServerError;
use lemma_core::Document;
use std::collections::{HashMap, VecDeque};
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

pub use crate::constants::DEFAULT_MAX_DOCUMENT_SIZE;

/// Open documents and the order in which they are checked.
#[derive(Debug)]
pub struct DocumentManager {
    /// Document store: URI -> latest version.
    documents: HashMap<Url, Document>,
    /// Documents with checking left to do, front first.
    rotation: VecDeque<Url>,
    /// Maximum document size in bytes.
    max_document_size: usize,
}

impl Default for DocumentManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_SIZE)
    }
}

impl DocumentManager {
    pub fn new(max_document_size: usize) -> Self {
        Self {
            documents: HashMap::new(),
            rotation: VecDeque::new(),
            max_document_size,
        }
    }

    /// Update maximum document size. Applies to subsequent opens and edits.
    pub fn set_max_document_size(&mut self, new_max: usize) {
        self.max_document_size = new_max;
        debug!("Max document size updated to: {} bytes", new_max);
    }

    pub fn max_document_size(&self) -> usize {
        self.max_document_size
    }

    fn check_size(&self, uri: &Url, text: &str) -> Result<(), ServerError> {
        if text.len() > self.max_document_size {
            warn!(
                "Document size limit exceeded for {}: {} bytes > {} bytes maximum (rejected)",
                uri,
                text.len(),
                self.max_document_size
            );
            return Err(ServerError::DocumentTooLarge {
                size: text.len(),
                max: self.max_document_size,
            });
        }
        Ok(())
    }

    /// Store `text` as version `version` of `uri`, replacing any previous
    /// version, and schedule it for checking ahead of every other document.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DocumentTooLarge`] if `text` exceeds the size
    /// limit. The previous version, if any, is left untouched.
    pub fn open(&mut self, uri: &Url, version: i32, text: String) -> Result<(), ServerError> {
        self.check_size(uri, &text)?;

        debug!(
            "Document stored: {} v{} ({} bytes, {} lines)",
            uri,
            version,
            text.len(),
            text.lines().count()
        );
        self.documents
            .insert(uri.clone(), Document::new(uri.as_str(), version, text));
        self.rotation.retain(|queued| queued != uri);
        self.rotation.push_front(uri.clone());
        Ok(())
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn get_mut(&mut self, uri: &Url) -> Option<&mut Document> {
        self.documents.get_mut(uri)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    /// Current version of `uri`, if open.
    pub fn version(&self, uri: &Url) -> Option<i32> {
        self.documents.get(uri).map(Document::version)
    }

    /// Remove a document. Returns the removed document, if it was open.
    pub fn remove(&mut self, uri: &Url) -> Option<Document> {
        self.rotation.retain(|queued| queued != uri);
        self.documents.remove(uri)
    }

    /// The document to check next: the front of the rotation.
    pub fn next_to_check(&self) -> Option<&Url> {
        self.rotation.front()
    }

    /// Take `uri` out of the rotation once its checking is terminal.
    pub fn finish(&mut self, uri: &Url) {
        self.rotation.retain(|queued| queued != uri);
    }

    pub fn has_pending_work(&self) -> bool {
        !self.rotation.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn all_uris(&self) -> Vec<Url> {
        self.documents.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///{}.v", name)).unwrap()
    }

    #[test]
    fn test_open_and_get() {
        let mut manager = DocumentManager::default();
        manager.open(&uri("a"), 1, "Check nat.".to_string()).unwrap();

        assert!(manager.contains(&uri("a")));
        assert_eq!(manager.version(&uri("a")), Some(1));
        assert_eq!(manager.get(&uri("a")).map(|doc| doc.text()), Some("Check nat."));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_size_limit() {
        let mut manager = DocumentManager::new(8);
        let result = manager.open(&uri("a"), 1, "Check very_long_name.".to_string());
        assert!(matches!(
            result,
            Err(ServerError::DocumentTooLarge { size: 21, max: 8 })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_rejected_edit_keeps_previous_version() {
        let mut manager = DocumentManager::new(16);
        manager.open(&uri("a"), 1, "Check nat.".to_string()).unwrap();
        assert!(manager
            .open(&uri("a"), 2, "Check nat. Check nat.".to_string())
            .is_err());
        assert_eq!(manager.version(&uri("a")), Some(1));
    }

    #[test]
    fn test_rotation_prefers_latest_edit() {
        let mut manager = DocumentManager::default();
        manager.open(&uri("a"), 1, "Check nat.".to_string()).unwrap();
        manager.open(&uri("b"), 1, "Check nat.".to_string()).unwrap();
        assert_eq!(manager.next_to_check(), Some(&uri("b")));

        manager.open(&uri("a"), 2, "Check bool.".to_string()).unwrap();
        assert_eq!(manager.next_to_check(), Some(&uri("a")));

        manager.finish(&uri("a"));
        assert_eq!(manager.next_to_check(), Some(&uri("b")));

        manager.remove(&uri("b"));
        assert!(!manager.has_pending_work());
        assert_eq!(manager.len(), 1);
    }
}
