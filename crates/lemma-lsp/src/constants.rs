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

//! LSP constants and magic number definitions.
//!
//! # Organization
//!
//! - **Scheduling**: checking increment sizes
//! - **Memory Limits**: document size constraints
//! - **LSP Protocol**: method names and protocol-specific values

// ============================================================================
// Scheduling
// ============================================================================

/// Default number of sentences checked per increment.
///
/// **Rationale**: The interrupt flag is polled before every sentence, so this
/// only bounds how long an increment runs when no request arrives. Small
/// increments keep progress notifications and wake-ups of postponed requests
/// frequent; 16 sentences of a typical script check in well under a
/// millisecond.
pub const DEFAULT_SENTENCES_PER_INCREMENT: usize = 16;

/// Name of the scheduler thread.
pub const SCHEDULER_THREAD_NAME: &str = "lemma-scheduler";

// ============================================================================
// Memory Limits
// ============================================================================

/// Bytes per megabyte (1024 * 1024).
pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Default maximum document size in bytes (64 MB).
///
/// **Rationale**: Proof scripts are hand-written; anything larger is almost
/// certainly generated and not worth checking interactively.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * BYTES_PER_MEGABYTE;

// ============================================================================
// LSP Protocol Constants
// ============================================================================

pub const METHOD_HOVER: &str = "textDocument/hover";
pub const METHOD_COMPLETION: &str = "textDocument/completion";
pub const METHOD_DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";

/// Custom request returning the proof state at a position.
pub const METHOD_GOALS: &str = "proof/goals";

/// Custom notification reporting checking progress.
pub const METHOD_FILE_PROGRESS: &str = "$/lemma/fileProgress";

/// Diagnostic source name shown by editors.
pub const DIAGNOSTIC_SOURCE: &str = "lemma";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_conversions() {
        assert_eq!(BYTES_PER_MEGABYTE, 1048576);
        assert_eq!(DEFAULT_MAX_DOCUMENT_SIZE, 67108864);
    }

    #[test]
    fn test_reasonable_limits() {
        assert!(DEFAULT_SENTENCES_PER_INCREMENT >= 1, "Increments must make progress");
        assert!(
            DEFAULT_SENTENCES_PER_INCREMENT <= 1024,
            "Increments too large, requests would wait behind checking"
        );
    }
}
