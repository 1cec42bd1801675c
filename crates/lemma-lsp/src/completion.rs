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

//! Autocompletion for proof scripts.
//!
//! Suggestions depend on the proof state at the cursor, so completion is
//! deferred until checking reaches the cursor.
//!
//! # Completion Contexts
//!
//! - **Command**: Top-level keywords (`Lemma`, `Definition`, `Check`, ...)
//! - **Tactic**: Tactics, inside a proof
//! - **Argument**: Declared names and hypotheses, after `exact`, `apply`,
//!   `rewrite` or a query keyword
//!
//! ```text
//! Lem|              → Suggests Lemma
//! Proof. intr|      → Suggests intro, intros
//! exact |           → Suggests hypotheses and earlier lemmas
//! ```

use crate::outcome::{Deferral, Outcome};
use crate::readiness::ready;
use crate::utils::{line_at, prefix_at, safe_slice_to};
use lemma_core::{
    Document, Position, DECLARATION_KEYWORDS, GOAL_KEYWORDS, KNOWN_TACTICS, QUERY_KEYWORDS,
};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, CompletionResponse};

/// Tactics whose argument names a hypothesis or declaration.
const ARGUMENT_TACTICS: &[&str] = &["exact", "apply", "rewrite"];

/// Proof structure keywords.
const PROOF_KEYWORDS: &[&str] = &["Proof", "Qed", "Admitted", "Abort"];

/// Completion context for determining what to suggest.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContext {
    Command,
    Tactic,
    Argument,
}

pub fn handle_completion(doc: &Document, position: Position) -> Outcome {
    if !ready(&doc.completion(), Some(position), None, doc.version()) {
        return Outcome::Deferred(Deferral::At(position));
    }
    Outcome::answered(CompletionResponse::Array(get_completions(doc, position)))
}

/// Get completions for a checked position.
pub fn get_completions(doc: &Document, position: Position) -> Vec<CompletionItem> {
    let line = line_at(doc.text(), position.line).unwrap_or("");
    let cursor = position.character as usize;
    let prefix = prefix_at(line, cursor);

    let items = match determine_context(doc, line, cursor, prefix, position) {
        CompletionContext::Command => command_completions(),
        CompletionContext::Tactic => tactic_completions(),
        CompletionContext::Argument => argument_completions(doc, position),
    };

    items
        .into_iter()
        .filter(|item| item.label.starts_with(prefix))
        .collect()
}

fn determine_context(
    doc: &Document,
    line: &str,
    cursor: usize,
    prefix: &str,
    position: Position,
) -> CompletionContext {
    let before = safe_slice_to(line, cursor);
    let before_word = before[..before.len() - prefix.len()].trim_end();
    let previous = before_word
        .rsplit(|c: char| c.is_whitespace() || c == '.')
        .next()
        .unwrap_or("");

    if !before_word.is_empty()
        && (ARGUMENT_TACTICS.contains(&previous) || QUERY_KEYWORDS.contains(&previous))
    {
        return CompletionContext::Argument;
    }
    if !doc.goals_at(position).is_empty() {
        return CompletionContext::Tactic;
    }
    CompletionContext::Command
}

fn command_completions() -> Vec<CompletionItem> {
    let keyword = |label: &str, detail: &str| CompletionItem {
        label: label.to_string(),
        kind: Some(CompletionItemKind::KEYWORD),
        detail: Some(detail.to_string()),
        ..Default::default()
    };

    GOAL_KEYWORDS
        .iter()
        .map(|kw| keyword(kw, "Start a proof"))
        .chain(DECLARATION_KEYWORDS.iter().map(|kw| keyword(kw, "Declare a name")))
        .chain(QUERY_KEYWORDS.iter().map(|kw| keyword(kw, "Query")))
        .chain(PROOF_KEYWORDS.iter().map(|kw| keyword(kw, "Proof structure")))
        .collect()
}

fn tactic_completions() -> Vec<CompletionItem> {
    KNOWN_TACTICS
        .iter()
        .filter(|tactic| **tactic != "fail")
        .map(|tactic| CompletionItem {
            label: tactic.to_string(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some("Tactic".to_string()),
            ..Default::default()
        })
        .chain(PROOF_KEYWORDS.iter().map(|kw| CompletionItem {
            label: kw.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..Default::default()
        }))
        .collect()
}

fn argument_completions(doc: &Document, position: Position) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = doc
        .goals_at(position)
        .first()
        .map(|goal| {
            goal.hypotheses
                .iter()
                .map(|(name, ty)| CompletionItem {
                    label: name.clone(),
                    kind: Some(CompletionItemKind::VARIABLE),
                    detail: Some(ty.clone()),
                    ..Default::default()
                })
                .collect()
        })
        .unwrap_or_default();

    items.extend(
        doc.declarations()
            .iter()
            .filter(|decl| decl.range.end <= position)
            .map(|decl| CompletionItem {
                label: decl.name.clone(),
                kind: Some(if decl.statement.is_some() {
                    CompletionItemKind::CONSTANT
                } else {
                    CompletionItemKind::VALUE
                }),
                detail: Some(match &decl.statement {
                    Some(statement) => format!("{} : {}", decl.keyword, statement),
                    None => decl.keyword.clone(),
                }),
                ..Default::default()
            }),
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    fn checked(text: &str) -> Document {
        let mut doc = Document::new("file:///c.v", 1, text);
        doc.check_all();
        doc
    }

    #[test]
    fn test_command_keywords() {
        let doc = checked("Check nat.\nLem");
        let items = get_completions(&doc, Position::new(1, 3));
        assert_eq!(labels(&items), vec!["Lemma"]);
    }

    #[test]
    fn test_tactics_inside_proof() {
        let doc = checked("Lemma t : A -> A.\nProof.\nintr");
        let items = get_completions(&doc, Position::new(2, 4));
        assert_eq!(labels(&items), vec!["intros", "intro"]);
    }

    #[test]
    fn test_arguments_after_exact() {
        let doc = checked("Axiom ax.\nLemma t : A -> A.\nProof.\nintros.\nexact ");
        let items = get_completions(&doc, Position::new(4, 6));
        let labels = labels(&items);
        assert!(labels.contains(&"H"));
        assert!(labels.contains(&"ax"));
        assert!(labels.contains(&"t"));
    }

    #[test]
    fn test_deferred_until_checked() {
        let doc = Document::new("file:///c.v", 1, "Check nat.\nLem");
        assert!(handle_completion(&doc, Position::new(1, 3)).is_deferred());
    }
}
