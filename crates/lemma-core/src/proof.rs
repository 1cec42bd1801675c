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

//! Proof state and tactic application.

use crate::error::{CheckError, CheckResult};
use crate::position::Range;
use std::fmt;

/// A single proof obligation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Goal {
    /// Named hypotheses, in introduction order.
    pub hypotheses: Vec<(String, String)>,
    pub conclusion: String,
}

impl Goal {
    pub fn new(conclusion: impl Into<String>) -> Self {
        Self {
            hypotheses: Vec::new(),
            conclusion: conclusion.into(),
        }
    }

    fn fresh_name(&self) -> String {
        let mut index = 0;
        loop {
            let candidate = if index == 0 {
                "H".to_string()
            } else {
                format!("H{}", index - 1)
            };
            if self.hypotheses.iter().all(|(name, _)| *name != candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ty) in &self.hypotheses {
            writeln!(f, "{} : {}", name, ty)?;
        }
        writeln!(f, "============================")?;
        write!(f, "{}", self.conclusion)
    }
}

/// Split `text` at the first top-level occurrence of `operator`.
fn split_top_level<'a>(text: &'a str, operator: &str) -> Option<(&'a str, &'a str)> {
    let mut depth = 0i32;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && text[idx..].starts_with(operator) => {
                return Some((text[..idx].trim(), text[idx + operator.len()..].trim()));
            }
            _ => {}
        }
    }
    None
}

fn strip_parens(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        let inner = &trimmed[1..trimmed.len() - 1];
        // Only strip when the outer parens match each other.
        let mut depth = 0i32;
        for ch in inner.chars() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return trimmed;
                    }
                }
                _ => {}
            }
        }
        return inner.trim();
    }
    trimmed
}

/// Goals of an open proof, first goal is the focused one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofState {
    pub name: String,
    pub goals: Vec<Goal>,
    /// Set once `admit` closed a goal.
    pub admitted: bool,
}

impl ProofState {
    pub fn new(name: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals: vec![Goal::new(statement)],
            admitted: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.goals.is_empty()
    }

    /// Apply one tactic to the focused goal.
    pub fn apply(&mut self, tactic: &str, argument: &str, range: Range) -> CheckResult<()> {
        if self.goals.is_empty() {
            return Err(CheckError::no_goal(
                format!("no goals remaining for `{}`", tactic),
                range,
            ));
        }

        match tactic {
            "intros" | "intro" => self.intro(tactic == "intros", argument, range),
            "split" => self.split(range),
            "reflexivity" => self.reflexivity(range),
            "assumption" => self.assumption(range),
            "exact" | "trivial" | "auto" | "easy" => {
                self.goals.remove(0);
                Ok(())
            }
            "admit" => {
                self.goals.remove(0);
                self.admitted = true;
                Ok(())
            }
            "fail" => Err(CheckError::tactic("tactic failure", range)),
            _ => Ok(()),
        }
    }

    fn intro(&mut self, many: bool, argument: &str, range: Range) -> CheckResult<()> {
        let goal = &mut self.goals[0];
        let mut names: Vec<String> = argument.split_whitespace().map(str::to_string).collect();
        let introduce_all = many && names.is_empty();
        let mut introduced = 0;

        loop {
            let Some((premise, rest)) = split_top_level(&goal.conclusion, "->") else {
                break;
            };
            let (premise, rest) = (strip_parens(premise).to_string(), rest.to_string());
            let name = if names.is_empty() {
                if !introduce_all && introduced > 0 {
                    break;
                }
                goal.fresh_name()
            } else {
                names.remove(0)
            };
            goal.hypotheses.push((name, premise));
            goal.conclusion = rest;
            introduced += 1;
            if !introduce_all && names.is_empty() {
                break;
            }
        }

        if introduced == 0 {
            return Err(CheckError::tactic(
                format!("no product to introduce in `{}`", goal.conclusion),
                range,
            ));
        }
        Ok(())
    }

    fn split(&mut self, range: Range) -> CheckResult<()> {
        let goal = &self.goals[0];
        let conclusion = strip_parens(&goal.conclusion);
        let (left, right) = split_top_level(conclusion, "/\\").ok_or_else(|| {
            CheckError::tactic(format!("`{}` is not a conjunction", goal.conclusion), range)
        })?;
        let mut left_goal = goal.clone();
        left_goal.conclusion = strip_parens(left).to_string();
        let mut right_goal = goal.clone();
        right_goal.conclusion = strip_parens(right).to_string();
        self.goals.splice(0..1, [left_goal, right_goal]);
        Ok(())
    }

    fn reflexivity(&mut self, range: Range) -> CheckResult<()> {
        let goal = &self.goals[0];
        match split_top_level(strip_parens(&goal.conclusion), "=") {
            Some((lhs, rhs)) if lhs == rhs => {
                self.goals.remove(0);
                Ok(())
            }
            _ => Err(CheckError::tactic(
                format!("cannot prove `{}` by reflexivity", goal.conclusion),
                range,
            )),
        }
    }

    fn assumption(&mut self, range: Range) -> CheckResult<()> {
        let goal = &self.goals[0];
        let target = strip_parens(&goal.conclusion);
        if goal.hypotheses.iter().any(|(_, ty)| strip_parens(ty) == target) {
            self.goals.remove(0);
            Ok(())
        } else {
            Err(CheckError::tactic("no matching hypothesis", range))
        }
    }
}
