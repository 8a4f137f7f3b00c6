// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query report rendering and persistence.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::output::{colorize_header, colorize_id, colorize_score, colorize_text};
use crate::text::ProcessedChunk;

/// Characters of original text shown per result on screen.
pub const PREVIEW_CHARS: usize = 500;

const RULE_WIDTH: usize = 80;

/// A processed result with its stable id.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// Stable result ID (blake3 hash)
    pub result_id: String,
    #[serde(flatten)]
    pub chunk: ProcessedChunk,
}

/// Results of one query run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    /// Unix timestamp (seconds)
    pub generated_at: u64,
    pub results: Vec<ReportEntry>,
}

impl Report {
    pub fn new(query: impl Into<String>, results: Vec<ProcessedChunk>) -> Self {
        let generated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let results = results
            .into_iter()
            .map(|chunk| ReportEntry {
                result_id: result_id(&chunk.id, chunk.similarity),
                chunk,
            })
            .collect();

        Self {
            query: query.into(),
            generated_at,
            results,
        }
    }

    /// Default file name for a saved report, stamped in local time
    /// (`query_results_YYYYMMDD_HHMMSS.txt`).
    pub fn file_name(&self) -> String {
        let stamp = DateTime::from_timestamp(self.generated_at as i64, 0)
            .unwrap_or_default()
            .with_timezone(&Local);
        format!("query_results_{}.txt", stamp.format("%Y%m%d_%H%M%S"))
    }
}

/// Generate a stable result ID using blake3 hash
pub fn result_id(chunk_id: &str, similarity: f32) -> String {
    let input = format!("{}:{:08x}", chunk_id, similarity.to_bits());
    let hash = blake3::hash(input.as_bytes());
    hash.to_hex()[..16].to_string()
}

/// Renders the report for the terminal, truncating long passages.
pub fn render_text(report: &Report, use_color: bool) -> String {
    render(report, use_color, false)
}

/// Renders the full report, including processed text.
pub fn render_full(report: &Report) -> String {
    render(report, false, true)
}

/// Renders the report as pretty JSON.
pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Writes the full report to `path`, creating parent directories.
pub fn write_report(report: &Report, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, render_full(report))
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn render(report: &Report, use_color: bool, full: bool) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{}",
        colorize_header(&format!("RESULTS FOR QUERY: '{}'", report.query), use_color)
    );
    let _ = writeln!(out, "{}", rule);

    for (idx, entry) in report.results.iter().enumerate() {
        let chunk = &entry.chunk;
        let _ = writeln!(
            out,
            "\nRESULT {} [{}] (Similarity Score: {}):",
            idx + 1,
            colorize_id(&chunk.id, use_color),
            colorize_score(&format!("{:.4}", chunk.similarity), use_color)
        );
        let _ = writeln!(out, "{}", thin);

        let original = if full {
            chunk.original_text.clone()
        } else {
            preview(&chunk.original_text, PREVIEW_CHARS)
        };
        let _ = writeln!(
            out,
            "Original Text: {}",
            colorize_text(&original, use_color)
        );
        if full {
            let _ = writeln!(out, "\nProcessed Text: {}", chunk.processed_text);
        }
        let _ = writeln!(out, "{}", thin);
    }

    out
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn processed(id: &str, text: &str, similarity: f32) -> ProcessedChunk {
        ProcessedChunk {
            id: id.to_string(),
            original_text: text.to_string(),
            processed_text: text.to_lowercase(),
            token_count: text.split_whitespace().count(),
            similarity,
        }
    }

    #[test]
    fn test_result_id_stability() {
        let id1 = result_id("para-3", 0.75);
        let id2 = result_id("para-3", 0.75);
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 16);

        assert_ne!(id1, result_id("para-3", 0.7501));
        assert_ne!(id1, result_id("para-4", 0.75));
    }

    #[test]
    fn test_render_text_truncates() {
        let long = "word ".repeat(200);
        let report = Report::new("neural", vec![processed("para-0", &long, 0.91234)]);
        let text = render_text(&report, false);

        assert!(text.contains("RESULTS FOR QUERY: 'neural'"));
        assert!(text.contains("RESULT 1 [para-0] (Similarity Score: 0.9123):"));
        assert!(text.contains("..."));
        assert!(!text.contains("Processed Text"));
    }

    #[test]
    fn test_render_full_includes_processed_text() {
        let report = Report::new("q", vec![processed("para-1", "Deep Learning", 0.5)]);
        let text = render_full(&report);
        assert!(text.contains("Original Text: Deep Learning"));
        assert!(text.contains("Processed Text: deep learning"));
    }

    #[test]
    fn test_render_json() {
        let report = Report::new("q", vec![processed("para-1", "Deep Learning", 0.5)]);
        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(json["query"], "q");
        assert_eq!(json["results"][0]["id"], "para-1");
        assert_eq!(json["results"][0]["similarity"], 0.5);
        assert_eq!(json["results"][0]["result_id"].as_str().unwrap().len(), 16);
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let report = Report::new("q", vec![processed("para-1", "Deep Learning", 0.5)]);
        let path = dir.path().join("logs").join(report.file_name());

        let written = write_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(written).unwrap();
        assert!(content.contains("Processed Text: deep learning"));
    }

    #[test]
    fn test_file_name_uses_date_stamp() {
        let mut report = Report::new("q", Vec::new());
        report.generated_at = 1_700_000_000;
        let name = report.file_name();

        let stamp = name
            .strip_prefix("query_results_")
            .and_then(|rest| rest.strip_suffix(".txt"))
            .unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp[..8].chars().chain(stamp[9..].chars()).all(|c| c.is_ascii_digit()));
        assert!(stamp.starts_with("2023111"));
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("hi", 5), "hi");
    }
}
