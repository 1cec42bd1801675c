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

//! Resumable checking of a single proof-script document.
//!
//! A [`Document`] owns the text of one version of a script, the sentences it
//! splits into, and the nodes produced for the sentences checked so far.
//! [`Document::resume`] checks a bounded number of further sentences and
//! yields early when its [`Interrupt`] is raised, so callers can interleave
//! other work between increments without losing progress.

use crate::command::{parse_command, Command, KNOWN_TACTICS};
use crate::error::{CheckError, CheckResult};
use crate::interrupt::Interrupt;
use crate::position::{Position, Range};
use crate::proof::{Goal, ProofState};
use crate::sentence::{split_sentences, Sentence};
use crate::status::Completion;

/// Severity of a message attached to a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
}

/// A message produced while checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn info(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Information,
            message: message.into(),
        }
    }

    fn warning(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl From<&CheckError> for Diagnostic {
    fn from(error: &CheckError) -> Self {
        Self {
            range: error.range,
            severity: Severity::Error,
            message: error.message.clone(),
        }
    }
}

/// A name introduced by a processed sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Command keyword that introduced the name (`Lemma`, `Definition`, ...).
    pub keyword: String,
    pub range: Range,
    /// Statement for goal-opening commands.
    pub statement: Option<String>,
}

/// The result of checking one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub range: Range,
    pub text: String,
    /// Open goals after this sentence.
    pub goals: Vec<Goal>,
    pub messages: Vec<Diagnostic>,
}

/// One version of a proof script together with its checking progress.
#[derive(Debug, Clone)]
pub struct Document {
    uri: String,
    version: i32,
    text: String,
    sentences: Vec<Sentence>,
    nodes: Vec<Node>,
    declarations: Vec<Declaration>,
    proof: Option<ProofState>,
    diagnostics: Vec<Diagnostic>,
    completion: Completion,
}

impl Document {
    /// Create an unchecked document.
    pub fn new(uri: impl Into<String>, version: i32, text: impl Into<String>) -> Self {
        let text = text.into();
        let sentences = split_sentences(&text);
        Self {
            uri: uri.into(),
            version,
            text,
            sentences,
            nodes: Vec::new(),
            declarations: Vec::new(),
            proof: None,
            diagnostics: Vec::new(),
            completion: Completion::default(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Number of sentences checked so far.
    pub fn checked_count(&self) -> usize {
        self.nodes.len()
    }

    /// The checked node whose range contains `position`.
    pub fn node_at(&self, position: Position) -> Option<&Node> {
        let idx = self.nodes.partition_point(|node| node.range.end <= position);
        self.nodes.get(idx).filter(|node| node.range.contains(position))
    }

    /// The last checked node starting at or before `position`.
    pub fn node_before(&self, position: Position) -> Option<&Node> {
        let idx = self.nodes.partition_point(|node| node.range.start <= position);
        idx.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// Goals in effect after the last sentence at or before `position`.
    pub fn goals_at(&self, position: Position) -> &[Goal] {
        self.node_before(position)
            .map(|node| node.goals.as_slice())
            .unwrap_or(&[])
    }

    /// Check up to `budget` more sentences, yielding early when `interrupt`
    /// is raised. Returns the updated completion status.
    pub fn resume(&mut self, interrupt: &Interrupt, budget: usize) -> Completion {
        if self.completion.is_terminal() {
            return self.completion;
        }

        let budget = budget.max(1);
        let mut checked = 0;
        while checked < budget && !interrupt.is_raised() {
            let Some(sentence) = self.sentences.get(self.nodes.len()).cloned() else {
                break;
            };
            match self.check_sentence(&sentence) {
                Ok(node) => self.push_node(node),
                Err(error) => {
                    self.fail(&sentence, error);
                    return self.completion;
                }
            }
            checked += 1;
        }

        self.completion = if self.nodes.len() == self.sentences.len() {
            self.finish();
            Completion::Done {
                range: self.checked_range(),
            }
        } else {
            Completion::Stopped {
                range: self.checked_range(),
            }
        };
        self.completion
    }

    /// Check everything without yielding.
    pub fn check_all(&mut self) -> Completion {
        let interrupt = Interrupt::new();
        while !self.completion.is_terminal() {
            self.resume(&interrupt, usize::MAX);
        }
        self.completion
    }

    fn checked_range(&self) -> Range {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => Range::new(first.range.start, last.range.end),
            _ => Range::point(Position::start()),
        }
    }

    fn push_node(&mut self, node: Node) {
        self.diagnostics.extend(node.messages.iter().cloned());
        self.nodes.push(node);
    }

    fn fail(&mut self, sentence: &Sentence, error: CheckError) {
        let diagnostic = Diagnostic::from(&error);
        let goals = self.current_goals();
        self.push_node(Node {
            range: sentence.range,
            text: sentence.text.clone(),
            goals,
            messages: vec![diagnostic],
        });
        self.completion = Completion::Failed { range: error.range };
    }

    fn finish(&mut self) {
        if let Some(proof) = &self.proof {
            let range = self
                .declarations
                .iter()
                .rev()
                .find(|decl| decl.name == proof.name)
                .map(|decl| decl.range)
                .unwrap_or_else(|| self.checked_range());
            let warning = Diagnostic::warning(
                range,
                format!("proof of `{}` is not finished", proof.name),
            );
            self.diagnostics.push(warning);
        }
    }

    fn current_goals(&self) -> Vec<Goal> {
        self.proof
            .as_ref()
            .map(|proof| proof.goals.clone())
            .unwrap_or_default()
    }

    fn declare(
        &mut self,
        name: &str,
        keyword: &str,
        range: Range,
        statement: Option<String>,
    ) -> CheckResult<()> {
        if self.declarations.iter().any(|decl| decl.name == name) {
            return Err(CheckError::duplicate(
                format!("`{}` already exists", name),
                range,
            ));
        }
        self.declarations.push(Declaration {
            name: name.to_string(),
            keyword: keyword.to_string(),
            range,
            statement,
        });
        Ok(())
    }

    fn check_sentence(&mut self, sentence: &Sentence) -> CheckResult<Node> {
        let range = sentence.range;
        if !sentence.terminated {
            return Err(CheckError::syntax("missing terminating `.`", range));
        }

        let mut messages = Vec::new();
        match parse_command(sentence.body(), range)? {
            Command::Goal {
                keyword,
                name,
                statement,
            } => {
                self.ensure_no_open_proof(range)?;
                self.declare(&name, &keyword, range, Some(statement.clone()))?;
                self.proof = Some(ProofState::new(name, statement));
            }
            Command::Declaration { keyword, name } => {
                self.ensure_no_open_proof(range)?;
                self.declare(&name, &keyword, range, None)?;
                messages.push(Diagnostic::info(range, format!("{} is defined", name)));
            }
            Command::Proof => {
                if self.proof.is_none() {
                    return Err(CheckError::no_goal("no proof in progress", range));
                }
            }
            Command::Qed => {
                let proof = self
                    .proof
                    .as_ref()
                    .ok_or_else(|| CheckError::no_goal("no proof in progress", range))?;
                if !proof.is_complete() {
                    return Err(CheckError::unfinished(
                        format!("{} goal(s) remaining in `{}`", proof.goals.len(), proof.name),
                        range,
                    ));
                }
                let message = if proof.admitted {
                    Diagnostic::warning(range, format!("{} uses admitted goals", proof.name))
                } else {
                    Diagnostic::info(range, format!("{} is defined", proof.name))
                };
                messages.push(message);
                self.proof = None;
            }
            Command::GiveUp { keyword } => {
                let proof = self
                    .proof
                    .take()
                    .ok_or_else(|| CheckError::no_goal("no proof in progress", range))?;
                let verb = if keyword == "Abort" { "aborted" } else { "admitted" };
                messages.push(Diagnostic::warning(range, format!("{} is {}", proof.name, verb)));
            }
            Command::Query { subject, .. } => {
                messages.push(Diagnostic::info(range, self.describe(&subject)));
            }
            Command::Tactic { name, argument } => match self.proof.as_mut() {
                Some(proof) => proof.apply(&name, &argument, range)?,
                None if KNOWN_TACTICS.contains(&name.as_str()) => {
                    return Err(CheckError::no_goal("no proof in progress", range));
                }
                None => {
                    return Err(CheckError::unknown_command(
                        format!("unknown command `{}`", name),
                        range,
                    ));
                }
            },
        }

        Ok(Node {
            range,
            text: sentence.text.clone(),
            goals: self.current_goals(),
            messages,
        })
    }

    fn ensure_no_open_proof(&self, range: Range) -> CheckResult<()> {
        match &self.proof {
            Some(proof) => Err(CheckError::unfinished(
                format!("proof of `{}` is still open", proof.name),
                range,
            )),
            None => Ok(()),
        }
    }

    fn describe(&self, subject: &str) -> String {
        match self.declarations.iter().find(|decl| decl.name == subject) {
            Some(Declaration {
                statement: Some(statement),
                ..
            }) => format!("{} : {}", subject, statement),
            Some(decl) => format!("{} ({})", subject, decl.keyword),
            None => format!("{} is not declared", subject),
        }
    }
}
