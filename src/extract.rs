// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk extraction from local documents.
//!
//! HTML pages (e.g. a saved Wikipedia article) are reduced to headings and
//! paragraphs; plain text is split on blank lines. Every paragraph is
//! cleaned of citation markers and bracketed spans and must be long enough
//! to carry content.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::embedding::Chunk;

/// Default minimum paragraph length in characters.
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 50;

/// Headings containing any of these (case-insensitive) are dropped.
pub const DEFAULT_SKIP_SECTIONS: &[&str] =
    &["see also", "references", "external links", "further reading"];

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").expect("valid citation regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid bracket regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Extraction settings
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Paragraphs must be longer than this many characters to be kept
    pub min_paragraph_chars: usize,
    /// Lowercase heading fragments whose headings are skipped
    pub skip_sections: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            skip_sections: DEFAULT_SKIP_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtractConfig {
    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    fn is_skipped_heading(&self, heading: &str) -> bool {
        let lower = heading.to_lowercase();
        self.skip_sections
            .iter()
            .any(|section| lower.contains(section.as_str()))
    }
}

struct Selectors {
    content: Selector,
    body: Selector,
    blocks: Selector,
}

static SELECTORS: Lazy<Selectors> = Lazy::new(|| Selectors {
    content: Selector::parse("#mw-content-text").expect("content selector"),
    body: Selector::parse("body").expect("body selector"),
    blocks: Selector::parse("h2, h3, p").expect("block selector"),
});

/// Removes citation markers and bracketed spans and collapses whitespace.
pub fn clean_paragraph(text: &str) -> String {
    let text = CITATION.replace_all(text.trim(), "");
    let text = BRACKETED.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Extracts heading and paragraph chunks from an HTML document.
pub fn extract_html(html: &str, config: &ExtractConfig) -> Vec<Chunk> {
    let document = Html::parse_document(html);
    let root = document
        .select(&SELECTORS.content)
        .next()
        .or_else(|| document.select(&SELECTORS.body).next());

    let Some(root) = root else {
        warn!("Could not find main content element");
        return Vec::new();
    };

    let mut chunks = Vec::new();
    for element in root.select(&SELECTORS.blocks) {
        if inside_toc(&element) {
            continue;
        }

        let raw: String = element.text().collect();
        match element.value().name() {
            "h2" | "h3" => {
                let heading = raw.trim();
                if config.is_skipped_heading(heading)
                    || heading.starts_with('[')
                    || heading.chars().count() < 2
                {
                    continue;
                }
                chunks.push(Chunk::new(format!("heading-{}", chunks.len()), heading));
            }
            _ => push_paragraph(&mut chunks, &raw, config),
        }
    }

    if chunks.is_empty() {
        warn!("No content was extracted after cleaning");
    }
    chunks
}

/// Splits plain text into paragraph chunks on blank lines.
pub fn extract_plain(text: &str, config: &ExtractConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut paragraph = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut chunks, &paragraph, config);
            paragraph.clear();
        } else {
            paragraph.push_str(line);
            paragraph.push('\n');
        }
    }
    push_paragraph(&mut chunks, &paragraph, config);

    if chunks.is_empty() {
        warn!("No content was extracted after cleaning");
    }
    chunks
}

/// Reads a document from disk and extracts its chunks.
///
/// Files ending in `.html` or `.htm` are parsed as HTML, anything else as
/// plain text. Invalid UTF-8 is replaced rather than rejected.
pub fn load_chunks(path: &Path, config: &ExtractConfig) -> Result<Vec<Chunk>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "html" | "htm"))
        .unwrap_or(false);

    let chunks = if is_html {
        extract_html(&content, config)
    } else {
        extract_plain(&content, config)
    };

    info!("Extracted {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}

fn push_paragraph(chunks: &mut Vec<Chunk>, raw: &str, config: &ExtractConfig) {
    let text = clean_paragraph(raw);
    if text.chars().count() > config.min_paragraph_chars {
        chunks.push(Chunk::new(format!("para-{}", chunks.len()), text));
    }
}

fn inside_toc(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            ancestor.value().name() == "div"
                && ancestor.value().classes().any(|class| class == "toc")
        })
}
