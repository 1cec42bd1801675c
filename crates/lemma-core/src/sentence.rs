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

//! Splitting proof scripts into sentences.
//!
//! A sentence ends at a `.` that is followed by whitespace or by the end of
//! input, so qualified names such as `Nat.add` stay inside one sentence.
//! `(* ... *)` comments nest and are skipped between sentences.

use crate::position::{Position, Range};

/// One sentence of a proof script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Source text, including the terminating `.` when present.
    pub text: String,
    /// Span of the sentence in the document.
    pub range: Range,
    /// False for trailing text that never saw its terminator.
    pub terminated: bool,
}

impl Sentence {
    /// Sentence text without the terminating dot and surrounding whitespace.
    pub fn body(&self) -> &str {
        let text = self.text.trim();
        text.strip_suffix('.').unwrap_or(text).trim()
    }
}

struct Cursor<'a> {
    chars: Vec<(usize, char)>,
    index: usize,
    position: Position,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().collect(),
            index: 0,
            position: Position::start(),
            source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, ch)| *ch)
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.index + 1).map(|(_, ch)| *ch)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = *self.chars.get(self.index)?;
        self.index += 1;
        if ch == '\n' {
            self.position.line += 1;
            self.position.character = 0;
        } else {
            self.position.character += ch.len_utf8() as u32;
        }
        Some(ch)
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('(') && self.peek_second() == Some('*')
    }

    /// Skip a (possibly nested) comment. Unclosed comments run to the end.
    fn skip_comment(&mut self) {
        let mut depth = 0usize;
        while self.peek().is_some() {
            if self.at_comment() {
                self.bump();
                self.bump();
                depth += 1;
            } else if self.peek() == Some('*') && self.peek_second() == Some(')') {
                self.bump();
                self.bump();
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else {
                self.bump();
            }
        }
    }
}

/// Split `source` into sentences in document order.
pub fn split_sentences(source: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut cursor = Cursor::new(source);
    let mut start: Option<(usize, Position)> = None;
    let mut last_end = Position::start();

    while let Some(ch) = cursor.peek() {
        if cursor.at_comment() {
            cursor.skip_comment();
            if start.is_some() {
                last_end = cursor.position;
            }
            continue;
        }

        if start.is_none() {
            if ch.is_whitespace() {
                cursor.bump();
                continue;
            }
            start = Some((cursor.offset(), cursor.position));
        }

        cursor.bump();
        if !ch.is_whitespace() {
            last_end = cursor.position;
        }

        let terminates = ch == '.' && cursor.peek().map_or(true, char::is_whitespace);
        if terminates {
            if let Some((begin, begin_position)) = start.take() {
                sentences.push(Sentence {
                    text: source[begin..cursor.offset()].to_string(),
                    range: Range::new(begin_position, cursor.position),
                    terminated: true,
                });
            }
        }
    }

    if let Some((begin, begin_position)) = start {
        sentences.push(Sentence {
            text: source[begin..].trim_end().to_string(),
            range: Range::new(begin_position, last_end),
            terminated: false,
        });
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_script() {
        let sentences = split_sentences("Lemma a : True.\nProof.\n  trivial.\nQed.\n");
        let bodies: Vec<_> = sentences.iter().map(|s| s.body()).collect();
        assert_eq!(bodies, vec!["Lemma a : True", "Proof", "trivial", "Qed"]);
        assert!(sentences.iter().all(|s| s.terminated));
    }

    #[test]
    fn test_ranges_track_lines_and_columns() {
        let sentences = split_sentences("Proof.  trivial.\n  Qed.");
        assert_eq!(sentences[0].range, Range::new(Position::new(0, 0), Position::new(0, 6)));
        assert_eq!(sentences[1].range, Range::new(Position::new(0, 8), Position::new(0, 16)));
        assert_eq!(sentences[2].range, Range::new(Position::new(1, 2), Position::new(1, 6)));
    }

    #[test]
    fn test_qualified_names_do_not_terminate() {
        let sentences = split_sentences("Check Nat.add.");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].body(), "Check Nat.add");
    }

    #[test]
    fn test_nested_comments_are_skipped() {
        let sentences = split_sentences("(* outer (* inner. *) still. *)\nQed.");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].body(), "Qed");
        assert_eq!(sentences[0].range.start, Position::new(1, 0));
    }

    #[test]
    fn test_comment_inside_sentence_does_not_terminate() {
        let sentences = split_sentences("intros (* done. *) x.");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "intros (* done. *) x.");
    }

    #[test]
    fn test_trailing_text_is_unterminated() {
        let sentences = split_sentences("Proof.\nintros x  \n");
        assert_eq!(sentences.len(), 2);
        assert!(!sentences[1].terminated);
        assert_eq!(sentences[1].text, "intros x");
        assert_eq!(sentences[1].range.end, Position::new(1, 8));
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  \n (* only a comment *) \n").is_empty());
    }
}
