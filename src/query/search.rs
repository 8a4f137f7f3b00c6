// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passage search: extract, embed, rank and report

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::cli::OutputFormat;
use crate::query::Status;
use wikirag::config::Config;
use wikirag::embedding::{EmbeddingEngine, TextFileLoader};
use wikirag::extract::load_chunks;
use wikirag::output::{format_duration, use_colors};
use wikirag::report::{render_json, render_text, write_report, Report};
use wikirag::retrieval::{chunk_texts, RetrievalConfig, RetrievalEngine};
use wikirag::text::TextProcessor;

/// Command-line overrides for a search run
#[derive(Debug, Default)]
pub struct SearchOptions {
    pub vocab: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub workers: Option<usize>,
    pub embed_workers: Option<usize>,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

/// Run the search command
pub fn run(query: &str, input: &Path, options: SearchOptions, format: OutputFormat) -> Result<Status> {
    let start_time = Instant::now();
    let use_color = use_colors() && format == OutputFormat::Text;
    let config = Config::load();

    let chunks = load_chunks(input, &config.extract.to_extract_config())?;
    if chunks.is_empty() {
        let message = format!("No passages could be extracted from {}", input.display());
        return nothing_found(query, &message, format, use_color);
    }

    let vocab_path = config.merge_vocabulary(options.vocab.as_deref()).ok_or_else(|| {
        anyhow!("No vocabulary configured: pass --vocab or set [vocabulary] path in .wikiragrc.toml")
    })?;
    let max_workers = options
        .embed_workers
        .filter(|&n| n > 0)
        .unwrap_or_else(|| config.embedding.max_workers());
    let engine = EmbeddingEngine::with_loader(TextFileLoader::new(&vocab_path))
        .with_max_workers(max_workers);

    let spinner = (!options.quiet)
        .then(|| spinner(format!("Loading vocabulary {}", vocab_path.display())));
    let loaded = engine.vocabulary();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let vocabulary = loaded
        .with_context(|| format!("Failed to load vocabulary from {}", vocab_path.display()))?;
    info!(
        "Vocabulary ready: {} words, dimension {}",
        vocabulary.len(),
        vocabulary.dimension()
    );

    let table = engine.create_embeddings(&chunks);
    if table.is_empty() {
        return nothing_found(query, "No passage could be embedded", format, use_color);
    }

    let Some(query_vector) = engine.embed_query(query) else {
        return nothing_found(query, "The query could not be embedded", format, use_color);
    };

    let workers = options
        .workers
        .filter(|&n| n > 0)
        .unwrap_or_else(|| config.retrieval.workers());
    let retrieval = RetrievalEngine::new(RetrievalConfig::new(workers));
    let top_k = config.merge_top_k(options.top_k);
    let results = retrieval.retrieve(&table, &chunk_texts(&chunks), &query_vector, top_k);
    if results.is_empty() {
        let message = format!("No results found for: {}", query);
        return nothing_found(query, &message, format, use_color);
    }

    let processed = TextProcessor::new().process_chunks(&results);
    let report = Report::new(query, processed);
    let elapsed = start_time.elapsed();

    match format {
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Text => print!("{}", render_text(&report, use_color)),
    }

    let report_path = options.output.or_else(|| {
        config
            .report
            .dir
            .as_ref()
            .map(|dir| dir.join(report.file_name()))
    });
    if let Some(path) = report_path {
        let written = write_report(&report, &path)?;
        if !options.quiet {
            eprintln!("Report saved to {}", written.display());
        }
    }

    // Print stats unless quiet
    if !options.quiet {
        eprintln!(
            "\n{} passages | {} embedded | {} results | {}",
            chunks.len(),
            table.len(),
            report.results.len(),
            format_duration(elapsed)
        );
    }

    Ok(Status::Found)
}

fn nothing_found(query: &str, message: &str, format: OutputFormat, use_color: bool) -> Result<Status> {
    info!("{}", message);
    match format {
        OutputFormat::Json => println!("{}", render_json(&Report::new(query, Vec::new()))?),
        OutputFormat::Text => {
            if use_color {
                println!("{} {}", "✗".red(), message.yellow());
            } else {
                println!("{}", message);
            }
        }
    }
    Ok(Status::NothingFound)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
