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

//! The `proof/goals` request: proof state at a position.

use crate::outcome::{Deferral, Outcome};
use crate::readiness::ready;
use crate::utils::to_lsp_position;
use lemma_core::{Document, Goal, Position};
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types;

/// One open goal, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInfo {
    /// Hypotheses as `name : type`.
    pub hypotheses: Vec<String>,
    pub conclusion: String,
}

impl From<&Goal> for GoalInfo {
    fn from(goal: &Goal) -> Self {
        Self {
            hypotheses: goal
                .hypotheses
                .iter()
                .map(|(name, ty)| format!("{} : {}", name, ty))
                .collect(),
            conclusion: goal.conclusion.clone(),
        }
    }
}

/// Result of `proof/goals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsResponse {
    pub uri: String,
    /// Version the goals were computed for.
    pub version: i32,
    pub position: lsp_types::Position,
    pub goals: Vec<GoalInfo>,
    /// Messages of the sentence at the position.
    pub messages: Vec<String>,
}

pub fn handle_goals(doc: &Document, position: Position) -> Outcome {
    if !ready(&doc.completion(), Some(position), None, doc.version()) {
        return Outcome::Deferred(Deferral::At(position));
    }
    Outcome::answered(get_goals(doc, position))
}

pub fn get_goals(doc: &Document, position: Position) -> GoalsResponse {
    let messages = doc
        .node_at(position)
        .map(|node| node.messages.iter().map(|m| m.message.clone()).collect())
        .unwrap_or_default();
    GoalsResponse {
        uri: doc.uri().to_string(),
        version: doc.version(),
        position: to_lsp_position(doc.text(), position),
        goals: doc.goals_at(position).iter().map(GoalInfo::from).collect(),
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCRIPT: &str = "Lemma and_swap : A /\\ B -> B /\\ A.\nProof.\nintros.\nsplit.\n";

    #[test]
    fn test_goals_after_intros() {
        let mut doc = Document::new("file:///swap.v", 4, SCRIPT);
        doc.check_all();

        let response = get_goals(&doc, Position::new(2, 3));
        assert_eq!(response.version, 4);
        assert_eq!(response.goals.len(), 1);
        assert_eq!(response.goals[0].hypotheses, vec!["H : A /\\ B".to_string()]);
        assert_eq!(response.goals[0].conclusion, "B /\\ A");

        let response = get_goals(&doc, Position::new(3, 0));
        assert_eq!(response.goals.len(), 2);
    }

    #[test]
    fn test_goals_before_any_sentence() {
        let mut doc = Document::new("file:///swap.v", 1, SCRIPT);
        doc.check_all();
        let response = get_goals(&doc, Position::start());
        assert_eq!(response.goals.len(), 1);
        assert!(response.messages.is_empty());
    }

    #[test]
    fn test_goals_deferred_until_checked() {
        let doc = Document::new("file:///swap.v", 1, SCRIPT);
        assert!(handle_goals(&doc, Position::new(3, 0)).is_deferred());
    }

    #[test]
    fn test_response_is_camel_case() {
        let mut doc = Document::new("file:///swap.v", 1, "Check nat.");
        doc.check_all();
        let value = serde_json::to_value(get_goals(&doc, Position::new(0, 2))).unwrap();
        assert_eq!(value["uri"], json!("file:///swap.v"));
        assert_eq!(value["position"], json!({ "line": 0, "character": 2 }));
        assert_eq!(value["goals"], json!([]));
    }
}
