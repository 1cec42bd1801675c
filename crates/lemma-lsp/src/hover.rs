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

//! Hover information for proof scripts.
//!
//! Hovering shows what the checker knows about the sentence under the
//! cursor, so it can only be answered once checking has moved past that
//! position. Until then the request is deferred.
//!
//! # Supported Elements
//!
//! - **Declared names**: Keyword and statement of a lemma or definition
//! - **Tactics**: A short description of what the tactic does
//! - **Sentences**: Open goals and messages after the sentence

use crate::outcome::{Deferral, Outcome};
use crate::readiness::ready;
use crate::utils::{line_at, to_lsp_position, to_lsp_range, word_at};
use lemma_core::{Declaration, Document, Node, Position, Severity, KNOWN_TACTICS};
use tower_lsp::lsp_types::{self, Hover, HoverContents, MarkupContent, MarkupKind};

/// Answer a hover request, or defer it until `position` is checked.
pub fn handle_hover(doc: &Document, position: Position) -> Outcome {
    if !ready(&doc.completion(), Some(position), None, doc.version()) {
        return Outcome::Deferred(Deferral::At(position));
    }
    Outcome::answered(get_hover(doc, position))
}

/// Get hover information for a checked position.
///
/// Returns `None` if there is nothing to show at the position.
pub fn get_hover(doc: &Document, position: Position) -> Option<Hover> {
    let line = line_at(doc.text(), position.line)?;
    let word = word_at(line, position.character as usize);

    if let Some((word, start, end)) = word {
        let word_range = lsp_types::Range {
            start: to_lsp_position(doc.text(), Position::new(position.line, start as u32)),
            end: to_lsp_position(doc.text(), Position::new(position.line, end as u32)),
        };

        if let Some(decl) = visible_declaration(doc, word, position) {
            return Some(Hover {
                contents: HoverContents::Markup(declaration_hover(decl)),
                range: Some(word_range),
            });
        }

        if let Some(description) = tactic_description(word) {
            return Some(Hover {
                contents: HoverContents::Markup(create_hover_content(
                    &format!("**Tactic** `{}`", word),
                    description,
                )),
                range: Some(word_range),
            });
        }
    }

    let node = doc.node_at(position)?;
    Some(Hover {
        contents: HoverContents::Markup(sentence_hover(node)),
        range: Some(to_lsp_range(doc.text(), node.range)),
    })
}

/// The declaration of `name` made at or before `position`.
fn visible_declaration<'a>(doc: &'a Document, name: &str, position: Position) -> Option<&'a Declaration> {
    doc.declarations()
        .iter()
        .rev()
        .find(|decl| decl.name == name && decl.range.start <= position)
}

fn declaration_hover(decl: &Declaration) -> MarkupContent {
    let title = format!("**{}** `{}`", decl.keyword, decl.name);
    let mut description = match &decl.statement {
        Some(statement) => format!("```\n{}\n```", statement),
        None => "No statement.".to_string(),
    };
    description.push_str(&format!("\n\nDeclared on line {}.", decl.range.start.line + 1));
    create_hover_content(&title, &description)
}

fn sentence_hover(node: &Node) -> MarkupContent {
    let title = format!("```\n{}\n```", node.text.trim());
    let mut description = match node.goals.len() {
        0 => "No open goals.".to_string(),
        1 => "1 open goal:".to_string(),
        n => format!("{} open goals:", n),
    };
    if let Some(goal) = node.goals.first() {
        description.push_str(&format!("\n\n```\n{}\n```", goal));
    }
    for message in &node.messages {
        let marker = match message.severity {
            Severity::Error => "✗",
            Severity::Warning => "⚠",
            Severity::Information => "ℹ",
        };
        description.push_str(&format!("\n\n{} {}", marker, message.message));
    }
    create_hover_content(&title, &description)
}

fn tactic_description(name: &str) -> Option<&'static str> {
    if !KNOWN_TACTICS.contains(&name) {
        return None;
    }
    Some(match name {
        "intros" => "Introduces every premise of the goal as a hypothesis.",
        "intro" => "Introduces one premise of the goal as a hypothesis.",
        "split" => "Splits a conjunction `A /\\ B` into two goals.",
        "exact" => "Closes the goal with the given term.",
        "assumption" => "Closes the goal if it matches a hypothesis.",
        "reflexivity" => "Closes an equality whose two sides are identical.",
        "trivial" | "auto" | "easy" => "Closes the goal automatically.",
        "admit" => "Gives up on the goal. The proof is marked as admitted.",
        "fail" => "Always fails.",
        _ => "Accepted without changing the goals.",
    })
}

fn create_hover_content(title: &str, description: &str) -> MarkupContent {
    MarkupContent {
        kind: MarkupKind::Markdown,
        value: format!("{}\n\n---\n\n{}", title, description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "Lemma id : A -> A.\nProof.\nintros.\nassumption.\nQed.\n";

    fn checked() -> Document {
        let mut doc = Document::new("file:///id.v", 1, SCRIPT);
        doc.check_all();
        doc
    }

    fn markup(hover: Hover) -> String {
        match hover.contents {
            HoverContents::Markup(content) => content.value,
            other => panic!("unexpected contents {:?}", other),
        }
    }

    #[test]
    fn test_unchecked_position_is_deferred() {
        let doc = Document::new("file:///id.v", 1, SCRIPT);
        assert_eq!(
            handle_hover(&doc, Position::new(3, 2)),
            Outcome::Deferred(Deferral::At(Position::new(3, 2)))
        );
    }

    #[test]
    fn test_hover_declaration() {
        let doc = checked();
        let hover = get_hover(&doc, Position::new(0, 7)).unwrap();
        let value = markup(hover);
        assert!(value.contains("**Lemma** `id`"));
        assert!(value.contains("A -> A"));
    }

    #[test]
    fn test_hover_tactic() {
        let doc = checked();
        let value = markup(get_hover(&doc, Position::new(3, 3)).unwrap());
        assert!(value.contains("**Tactic** `assumption`"));
    }

    #[test]
    fn test_hover_sentence_goals() {
        let doc = checked();
        let value = markup(get_hover(&doc, Position::new(1, 2)).unwrap());
        assert!(value.contains("Proof."));
        assert!(value.contains("1 open goal"));
        assert!(value.contains("A -> A"));
    }

    #[test]
    fn test_hover_outside_text() {
        let doc = checked();
        assert!(get_hover(&doc, Position::new(40, 0)).is_none());
        assert_eq!(handle_hover(&doc, Position::new(40, 0)), Outcome::Answered(serde_json::Value::Null));
    }
}
