// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// wikirag - Question answering over a single document
///
/// Splits a page into passages, embeds them with averaged word vectors and
/// returns the passages most similar to a query.
#[derive(Parser, Debug)]
#[command(name = "wikirag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level used when WIKIRAG_LOG is not set
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warning)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a query with the most similar passages of a document
    #[command(alias = "s")]
    Search {
        /// Query text
        query: String,

        /// Document to search (.html/.htm parsed as HTML, anything else as text)
        #[arg(short, long)]
        input: PathBuf,

        /// GloVe / word2vec text vocabulary (overrides [vocabulary] path)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Number of passages to return
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,

        /// Similarity scoring workers
        #[arg(long)]
        workers: Option<usize>,

        /// Upper bound on embedding workers
        #[arg(long)]
        embed_workers: Option<usize>,

        /// Save the full report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suppress the spinner and statistics
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the passages extracted from a document
    Chunks {
        /// Document to split
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
