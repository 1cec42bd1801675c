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

//! Position conversion and safe string handling.
//!
//! The client counts columns in UTF-16 code units, the checker in bytes.
//! Positions are converted against the line text whenever they cross the
//! transport boundary. Columns past the end of a line keep their distance
//! from the line end, so ordering against checked positions is preserved.

use lemma_core::{Position as CorePosition, Range as CoreRange};
use tower_lsp::lsp_types::{Position, Range};

/// Byte column of UTF-16 column `character` in `line`.
///
/// A column inside a surrogate pair maps to the start of its character.
pub fn utf16_to_byte(line: &str, character: u32) -> u32 {
    let mut units = 0;
    for (idx, c) in line.char_indices() {
        let next = units + c.len_utf16() as u32;
        if next > character {
            return idx as u32;
        }
        units = next;
    }
    line.len() as u32 + (character - units)
}

/// UTF-16 column of byte column `byte` in `line`.
///
/// A byte inside a multi-byte character maps to the start of that character.
pub fn byte_to_utf16(line: &str, byte: u32) -> u32 {
    let mut units = 0;
    for (idx, c) in line.char_indices() {
        if idx + c.len_utf8() > byte as usize {
            return units;
        }
        units += c.len_utf16() as u32;
    }
    units + (byte - (line.len() as u32).min(byte))
}

/// Convert a client position to a checker position within `text`.
pub fn to_core_position(text: &str, position: Position) -> CorePosition {
    let character = match line_at(text, position.line) {
        Some(line) => utf16_to_byte(line, position.character),
        None => position.character,
    };
    CorePosition::new(position.line, character)
}

/// Convert a checker position within `text` to a client position.
pub fn to_lsp_position(text: &str, position: CorePosition) -> Position {
    let character = match line_at(text, position.line) {
        Some(line) => byte_to_utf16(line, position.character),
        None => position.character,
    };
    Position {
        line: position.line,
        character,
    }
}

pub fn to_lsp_range(text: &str, range: CoreRange) -> Range {
    Range {
        start: to_lsp_position(text, range.start),
        end: to_lsp_position(text, range.end),
    }
}

/// Safely get a string slice up to a byte position, rounding down to the
/// nearest UTF-8 character boundary.
///
/// ```
/// use lemma_lsp::utils::safe_slice_to;
///
/// let s = "intro α";
/// assert_eq!(safe_slice_to(s, 6), "intro ");
/// // Position 7 is inside `α`, so it rounds down to 6
/// assert_eq!(safe_slice_to(s, 7), "intro ");
/// ```
pub fn safe_slice_to(s: &str, char_pos: usize) -> &str {
    if char_pos >= s.len() {
        return s;
    }

    let mut pos = char_pos;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    &s[..pos]
}

/// Safely get a string slice from a byte position, rounding down to the
/// nearest UTF-8 character boundary.
pub fn safe_slice_from(s: &str, char_pos: usize) -> &str {
    if char_pos >= s.len() {
        return "";
    }

    let mut pos = char_pos;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    &s[pos..]
}

/// Text of line `line` (0-based), without its terminator.
pub fn line_at(text: &str, line: u32) -> Option<&str> {
    text.lines().nth(line as usize)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// Identifier touching byte offset `pos`, with its byte range.
pub fn word_at(line: &str, pos: usize) -> Option<(&str, usize, usize)> {
    let before = safe_slice_to(line, pos);
    let after = safe_slice_from(line, pos);

    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(before.len());
    let end = before.len()
        + after
            .char_indices()
            .find(|(_, c)| !is_word_char(*c))
            .map(|(idx, _)| idx)
            .unwrap_or(after.len());

    if start == end {
        return None;
    }
    Some((&line[start..end], start, end))
}

/// Identifier prefix ending at byte offset `pos`, used for completion.
pub fn prefix_at(line: &str, pos: usize) -> &str {
    let before = safe_slice_to(line, pos);
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(before.len());
    &before[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_slice_to_utf8() {
        let s = "Hello 世界"; // "世" is 3 bytes at position 6
        assert_eq!(safe_slice_to(s, 6), "Hello ");
        assert_eq!(safe_slice_to(s, 7), "Hello ");
        assert_eq!(safe_slice_to(s, 9), "Hello 世");
        assert_eq!(safe_slice_to(s, 100), s);
    }

    #[test]
    fn test_safe_slice_from_utf8() {
        let s = "Hello 世界";
        assert_eq!(safe_slice_from(s, 6), "世界");
        assert_eq!(safe_slice_from(s, 8), "世界");
        assert_eq!(safe_slice_from(s, 100), "");
    }

    #[test]
    fn test_word_at() {
        let line = "exact conj_intro H.";
        assert_eq!(word_at(line, 8), Some(("conj_intro", 6, 16)));
        assert_eq!(word_at(line, 6), Some(("conj_intro", 6, 16)));
        assert_eq!(word_at(line, 16), Some(("conj_intro", 6, 16)));
        assert_eq!(word_at(line, 18), Some(("H", 17, 18)));
        assert_eq!(word_at("a  b", 2), None);
    }

    #[test]
    fn test_prefix_at() {
        assert_eq!(prefix_at("  refl", 6), "refl");
        assert_eq!(prefix_at("exact ", 6), "");
        assert_eq!(prefix_at("x", 0), "");
    }

    #[test]
    fn test_position_conversion_ascii() {
        let text = "Check nat.\nCheck bool.\n";
        let core = CorePosition::new(1, 7);
        assert_eq!(to_lsp_position(text, core), Position::new(1, 7));
        assert_eq!(to_core_position(text, Position::new(1, 7)), core);
    }

    #[test]
    fn test_position_conversion_multibyte() {
        // `∀` and `→` are three bytes and one UTF-16 unit each.
        let text = "Check ∀. Check x.\nLemma l : A → A.\n";
        assert_eq!(to_core_position(text, Position::new(0, 9)), CorePosition::new(0, 11));
        assert_eq!(to_lsp_position(text, CorePosition::new(0, 11)), Position::new(0, 9));
        assert_eq!(to_core_position(text, Position::new(1, 13)), CorePosition::new(1, 15));
        assert_eq!(
            to_lsp_range(text, CoreRange::new(CorePosition::new(0, 6), CorePosition::new(0, 10))),
            Range::new(Position::new(0, 6), Position::new(0, 8))
        );
    }

    #[test]
    fn test_position_conversion_surrogate_pair() {
        // `𝔹` is four bytes and two UTF-16 units.
        let line = "Check 𝔹.";
        assert_eq!(utf16_to_byte(line, 6), 6);
        assert_eq!(utf16_to_byte(line, 7), 6);
        assert_eq!(utf16_to_byte(line, 8), 10);
        assert_eq!(byte_to_utf16(line, 10), 8);
        assert_eq!(byte_to_utf16(line, 8), 6);
    }

    #[test]
    fn test_position_conversion_past_line_end() {
        let text = "∀.\n";
        assert_eq!(to_core_position(text, Position::new(0, 4)), CorePosition::new(0, 6));
        assert_eq!(to_lsp_position(text, CorePosition::new(0, 6)), Position::new(0, 4));
        assert_eq!(to_core_position(text, Position::new(5, 3)), CorePosition::new(5, 3));
    }
}
