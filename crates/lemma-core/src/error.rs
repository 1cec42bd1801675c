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

//! Error types for proof-script checking.

use crate::position::Range;
use std::fmt;
use thiserror::Error;

/// The kind of error raised while checking a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckErrorKind {
    /// Malformed sentence (missing name, missing terminator, ...).
    Syntax,
    /// Command the checker does not know.
    UnknownCommand,
    /// Tactic used where no proof is open or no goal remains.
    NoGoal,
    /// Proof closed while goals remain.
    Unfinished,
    /// Tactic that failed on purpose or could not apply.
    TacticFailure,
    /// Name declared twice.
    Duplicate,
}

impl fmt::Display for CheckErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "SyntaxError"),
            Self::UnknownCommand => write!(f, "UnknownCommand"),
            Self::NoGoal => write!(f, "NoGoalError"),
            Self::Unfinished => write!(f, "UnfinishedProof"),
            Self::TacticFailure => write!(f, "TacticFailure"),
            Self::Duplicate => write!(f, "DuplicateName"),
        }
    }
}

/// An error found while checking a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {range}: {message}")]
pub struct CheckError {
    pub kind: CheckErrorKind,
    pub message: String,
    /// Range of the offending sentence.
    pub range: Range,
}

impl CheckError {
    pub fn new(kind: CheckErrorKind, message: impl Into<String>, range: Range) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
        }
    }

    pub fn syntax(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::Syntax, message, range)
    }

    pub fn unknown_command(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::UnknownCommand, message, range)
    }

    pub fn no_goal(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::NoGoal, message, range)
    }

    pub fn unfinished(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::Unfinished, message, range)
    }

    pub fn tactic(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::TacticFailure, message, range)
    }

    pub fn duplicate(message: impl Into<String>, range: Range) -> Self {
        Self::new(CheckErrorKind::Duplicate, message, range)
    }
}

/// Result alias for checking operations.
pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_error_display() {
        let range = Range::new(Position::new(3, 0), Position::new(3, 4));
        let err = CheckError::unfinished("1 goal remaining", range);
        assert_eq!(err.to_string(), "UnfinishedProof at 3:0-3:4: 1 goal remaining");
    }

    #[test]
    fn test_kind_is_preserved() {
        let err = CheckError::no_goal("nothing to prove", Range::default());
        assert_eq!(err.kind, CheckErrorKind::NoGoal);
    }
}
