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

//! How far checking of a document has progressed.

use crate::position::{Position, Range};

/// Completion status of a document.
///
/// Every variant carries a range; only its end, the frontier, matters when
/// deciding whether a position has already been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every sentence has been checked.
    Done { range: Range },
    /// Checking hit an error and halted at `range`.
    Failed { range: Range },
    /// Checking yielded; more sentences remain after `range`.
    Stopped { range: Range },
}

impl Completion {
    pub fn range(&self) -> Range {
        match self {
            Self::Done { range } | Self::Failed { range } | Self::Stopped { range } => *range,
        }
    }

    /// End of the checked region.
    pub fn frontier(&self) -> Position {
        self.range().end
    }

    /// Whether resuming can make further progress without an edit.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Stopped { .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::Stopped {
            range: Range::point(Position::start()),
        }
    }
}
