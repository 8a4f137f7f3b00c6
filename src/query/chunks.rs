// SPDX-License-Identifier: MIT OR Apache-2.0

//! List the passages extracted from a document

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::query::Status;
use wikirag::config::Config;
use wikirag::extract::load_chunks;
use wikirag::output::{colorize_id, use_colors};

/// Run the chunks command
pub fn run(input: &Path, format: OutputFormat) -> Result<Status> {
    let use_color = use_colors() && format == OutputFormat::Text;
    let config = Config::load();
    let chunks = load_chunks(input, &config.extract.to_extract_config())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chunks)?),
        OutputFormat::Text => {
            if chunks.is_empty() {
                if use_color {
                    println!("{} No passages found in: {}", "✗".red(), input.display());
                } else {
                    println!("No passages found in: {}", input.display());
                }
            }
            for chunk in &chunks {
                println!("[{}] {}", colorize_id(&chunk.id, use_color), chunk.text);
            }
        }
    }

    if chunks.is_empty() {
        Ok(Status::NothingFound)
    } else {
        Ok(Status::Found)
    }
}
