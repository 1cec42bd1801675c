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

//! Lemma Language Server binary.
//!
//! Provides IDE integration for lemma proof scripts through the Language
//! Server Protocol.
//!
//! # Usage
//!
//! ```bash
//! # Run the language server (stdio transport)
//! lemma-lsp
//!
//! # Smaller checking increments, without supersession of postponed requests
//! lemma-lsp --sentences-per-increment 4 --no-supersede
//!
//! # With debug logging
//! RUST_LOG=debug lemma-lsp
//! ```
//!
//! # Features
//!
//! - **Diagnostics**: Published whenever checking of a document finishes
//! - **Progress**: `$/lemma/fileProgress` after every checking increment
//! - **Hover**: Declarations, tactics and proof state under the cursor
//! - **Goals**: `proof/goals` returns the open goals at a position
//! - **Autocomplete**: Keywords, tactics and declared names
//! - **Document Symbols**: Outline of declared names

use clap::Parser;
use lemma_lsp::constants::{
    BYTES_PER_MEGABYTE, DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_SENTENCES_PER_INCREMENT, METHOD_GOALS,
};
use lemma_lsp::{LemmaLanguageServer, ServerConfig};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lemma-lsp")]
#[command(author, version, about = "Language server for lemma proof scripts", long_about = None)]
struct Cli {
    /// Maximum document size in megabytes
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_MAX_DOCUMENT_SIZE / BYTES_PER_MEGABYTE)]
    max_document_size: usize,

    /// Sentences checked before the request queue is looked at again
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SENTENCES_PER_INCREMENT)]
    sentences_per_increment: usize,

    /// Keep postponed requests when a newer request targets an earlier position
    #[arg(long)]
    no_supersede: bool,
}

impl Cli {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            max_document_size: self.max_document_size.saturating_mul(BYTES_PER_MEGABYTE),
            sentences_per_increment: self.sentences_per_increment.max(1),
            supersede_postponed: !self.no_supersede,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lemma_lsp=info".parse().expect("valid log directive"))
                .add_directive("tower_lsp=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Lemma Language Server v{}", lemma_lsp::VERSION);

    let config = cli.config();
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::build(|client| LemmaLanguageServer::with_config(client, config))
            .custom_method(METHOD_GOALS, LemmaLanguageServer::goals)
            .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}
