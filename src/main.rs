// SPDX-License-Identifier: MIT OR Apache-2.0

//! wikirag - Question answering over a single document
//!
//! Extracts passages from a page, embeds them with averaged word vectors on
//! a worker pool and ranks them against a query by cosine similarity.

mod cli;
mod query;

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // WIKIRAG_LOG wins over --log-level (e.g., WIKIRAG_LOG=debug wikirag search ...)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WIKIRAG_LOG")
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;

    let status = match cli.command {
        Commands::Search {
            query,
            input,
            vocab,
            top_k,
            workers,
            embed_workers,
            output,
            quiet,
        } => query::search::run(
            &query,
            &input,
            query::search::SearchOptions {
                vocab,
                top_k,
                workers,
                embed_workers,
                output,
                quiet,
            },
            format,
        )?,
        Commands::Chunks { input } => query::chunks::run(&input, format)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "wikirag", &mut std::io::stdout());
            query::Status::Found
        }
    };

    Ok(status.exit_code())
}
