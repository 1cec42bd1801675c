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

//! Classification of sentences into vernacular commands and tactics.

use crate::error::{CheckError, CheckResult};
use crate::position::Range;

/// Commands that open a proof obligation.
pub const GOAL_KEYWORDS: &[&str] = &["Theorem", "Lemma", "Fact", "Example", "Corollary"];

/// Commands that only declare a name.
pub const DECLARATION_KEYWORDS: &[&str] = &["Definition", "Axiom", "Parameter", "Inductive"];

/// Informational queries.
pub const QUERY_KEYWORDS: &[&str] = &["Check", "Print", "About"];

/// Tactics the checker understands. Anything else inside a proof is accepted
/// and leaves the goals unchanged.
pub const KNOWN_TACTICS: &[&str] = &[
    "intros",
    "intro",
    "split",
    "exact",
    "assumption",
    "reflexivity",
    "trivial",
    "auto",
    "easy",
    "admit",
    "simpl",
    "rewrite",
    "apply",
    "induction",
    "destruct",
    "fail",
];

/// A classified sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `Theorem name : statement` and friends.
    Goal {
        keyword: String,
        name: String,
        statement: String,
    },
    /// `Definition name ...` and friends.
    Declaration { keyword: String, name: String },
    Proof,
    /// `Qed` or `Defined`.
    Qed,
    /// `Admitted` or `Abort`.
    GiveUp { keyword: String },
    Query { keyword: String, subject: String },
    /// Everything else; only meaningful inside a proof.
    Tactic { name: String, argument: String },
}

/// Remove `(* ... *)` comments from sentence text.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '(' && chars.peek() == Some(&'*') {
            chars.next();
            depth += 1;
        } else if depth > 0 && ch == '*' && chars.peek() == Some(&')') {
            chars.next();
            depth -= 1;
        } else if depth == 0 {
            out.push(ch);
        }
    }
    out
}

/// Classify a sentence body (terminator already removed).
pub fn parse_command(body: &str, range: Range) -> CheckResult<Command> {
    let cleaned = strip_comments(body);
    // Bullets and braces structure proofs but carry no meaning here.
    let text = cleaned
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '+' | '*' | '{' | '}') || c.is_whitespace());

    let (head, rest) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    };

    if GOAL_KEYWORDS.contains(&head) {
        let (name, statement) = rest
            .split_once(':')
            .ok_or_else(|| CheckError::syntax(format!("expected `{} name : statement`", head), range))?;
        let name = name.trim();
        let statement = statement.trim();
        if !is_identifier(name) {
            return Err(CheckError::syntax(format!("invalid name `{}`", name), range));
        }
        if statement.is_empty() {
            return Err(CheckError::syntax("missing statement", range));
        }
        return Ok(Command::Goal {
            keyword: head.to_string(),
            name: name.to_string(),
            statement: statement.to_string(),
        });
    }

    if DECLARATION_KEYWORDS.contains(&head) {
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '\'')
            .collect();
        if !is_identifier(&name) {
            return Err(CheckError::syntax(format!("`{}` expects a name", head), range));
        }
        return Ok(Command::Declaration {
            keyword: head.to_string(),
            name,
        });
    }

    if QUERY_KEYWORDS.contains(&head) {
        if rest.is_empty() {
            return Err(CheckError::syntax(format!("`{}` expects a term", head), range));
        }
        return Ok(Command::Query {
            keyword: head.to_string(),
            subject: rest.to_string(),
        });
    }

    Ok(match head {
        "Proof" => Command::Proof,
        "Qed" | "Defined" => Command::Qed,
        "Admitted" | "Abort" => Command::GiveUp {
            keyword: head.to_string(),
        },
        "" => return Err(CheckError::syntax("empty sentence", range)),
        _ => Command::Tactic {
            name: head.to_string(),
            argument: rest.to_string(),
        },
    })
}

/// Identifiers start with a letter or `_` and continue with alphanumerics, `_` or `'`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
        }
        _ => false,
    }
}
