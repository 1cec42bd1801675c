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

//! Document symbols for the outline view.
//!
//! The outline lists every declared name, so it is only answered once the
//! whole document is checked.

use crate::outcome::{Deferral, Outcome};
use crate::readiness::ready;
use crate::utils::to_lsp_range;
use lemma_core::{Declaration, Document, GOAL_KEYWORDS};
use tower_lsp::lsp_types::{DocumentSymbol, DocumentSymbolResponse, SymbolKind};
use tracing::debug;

pub fn handle_document_symbols(doc: &Document) -> Outcome {
    if !ready(&doc.completion(), None, None, doc.version()) {
        return Outcome::Deferred(Deferral::UntilDone);
    }
    Outcome::answered(DocumentSymbolResponse::Nested(get_document_symbols(doc)))
}

/// Get document symbols for outline view, in declaration order.
#[allow(deprecated)]
pub fn get_document_symbols(doc: &Document) -> Vec<DocumentSymbol> {
    let symbols: Vec<_> = doc
        .declarations()
        .iter()
        .map(|decl| DocumentSymbol {
            name: decl.name.clone(),
            detail: Some(detail(decl)),
            kind: symbol_kind(decl),
            tags: None,
            deprecated: None,
            range: to_lsp_range(doc.text(), decl.range),
            selection_range: to_lsp_range(doc.text(), decl.range),
            children: None,
        })
        .collect();
    debug!("Extracted {} symbols from {}", symbols.len(), doc.uri());
    symbols
}

fn detail(decl: &Declaration) -> String {
    match &decl.statement {
        Some(statement) => format!("{} : {}", decl.keyword, statement),
        None => decl.keyword.clone(),
    }
}

fn symbol_kind(decl: &Declaration) -> SymbolKind {
    if GOAL_KEYWORDS.contains(&decl.keyword.as_str()) {
        return SymbolKind::METHOD;
    }
    match decl.keyword.as_str() {
        "Inductive" => SymbolKind::ENUM,
        "Axiom" | "Parameter" => SymbolKind::CONSTANT,
        _ => SymbolKind::FUNCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemma_core::Interrupt;

    const SCRIPT: &str = "Inductive nat.\nDefinition two.\nLemma refl : two = two.\nProof.\nreflexivity.\nQed.\n";

    #[test]
    fn test_symbols_in_order() {
        let mut doc = Document::new("file:///s.v", 1, SCRIPT);
        doc.check_all();

        let symbols = get_document_symbols(&doc);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["nat", "two", "refl"]);
        assert_eq!(symbols[0].kind, SymbolKind::ENUM);
        assert_eq!(symbols[2].kind, SymbolKind::METHOD);
        assert_eq!(symbols[2].detail.as_deref(), Some("Lemma : two = two"));
    }

    #[test]
    fn test_deferred_until_done() {
        let mut doc = Document::new("file:///s.v", 1, SCRIPT);
        doc.resume(&Interrupt::new(), 2);
        assert_eq!(
            handle_document_symbols(&doc),
            Outcome::Deferred(Deferral::UntilDone)
        );

        doc.check_all();
        assert!(matches!(handle_document_symbols(&doc), Outcome::Answered(_)));
    }
}
