// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for wikirag
//!
//! Loads configuration from .wikiragrc.toml in current directory or ~/.config/wikirag/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extract::{ExtractConfig, DEFAULT_MIN_PARAGRAPH_CHARS, DEFAULT_SKIP_SECTIONS};
use crate::pool;

/// Default number of results to return
pub const DEFAULT_TOP_K: usize = 3;

/// Vocabulary configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Path to a GloVe / word2vec text file
    pub path: Option<PathBuf>,
}

impl VocabularyConfig {
    /// Get vocabulary path (no default)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Upper bound on embedding workers
    pub max_workers: Option<usize>,
}

impl EmbeddingConfig {
    /// Get max workers (defaults to available parallelism)
    pub fn max_workers(&self) -> usize {
        self.max_workers
            .filter(|&n| n > 0)
            .unwrap_or_else(pool::available_workers)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    /// Number of similarity scoring workers
    pub workers: Option<usize>,
    /// Number of results to return
    pub top_k: Option<usize>,
}

impl RetrievalSection {
    /// Get scoring workers (defaults to 4)
    pub fn workers(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or(pool::DEFAULT_RETRIEVAL_WORKERS)
    }

    /// Get top k (defaults to 3)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    /// Minimum paragraph length in characters
    pub min_paragraph_chars: Option<usize>,
    /// Heading fragments whose sections are skipped
    pub skip_sections: Option<Vec<String>>,
}

impl ExtractSection {
    /// Get min paragraph chars (defaults to 50)
    pub fn min_paragraph_chars(&self) -> usize {
        self.min_paragraph_chars
            .unwrap_or(DEFAULT_MIN_PARAGRAPH_CHARS)
    }

    /// Build the extractor settings
    pub fn to_extract_config(&self) -> ExtractConfig {
        let skip_sections = match &self.skip_sections {
            Some(sections) => sections.iter().map(|s| s.to_lowercase()).collect(),
            None => DEFAULT_SKIP_SECTIONS.iter().map(|s| s.to_string()).collect(),
        };
        ExtractConfig {
            min_paragraph_chars: self.min_paragraph_chars(),
            skip_sections,
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory for saved query reports (unset: no report is written)
    pub dir: Option<PathBuf>,
}

/// Configuration loaded from .wikiragrc.toml or ~/.config/wikirag/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vocabulary configuration
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalSection,

    /// Extraction configuration
    #[serde(default)]
    pub extract: ExtractSection,

    /// Report configuration
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .wikiragrc.toml in current directory
    /// 2. ~/.config/wikirag/config.toml
    pub fn load() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(Path::new(".wikiragrc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("wikirag").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Parse a configuration file, returning None when missing or invalid
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge CLI top-k with config (CLI wins)
    pub fn merge_top_k(&self, cli_value: Option<usize>) -> usize {
        cli_value.unwrap_or_else(|| self.retrieval.top_k())
    }

    /// Merge CLI vocabulary path with config (CLI wins)
    pub fn merge_vocabulary(&self, cli_value: Option<&Path>) -> Option<PathBuf> {
        cli_value
            .or_else(|| self.vocabulary.path())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retrieval.workers(), 4);
        assert_eq!(config.retrieval.top_k(), 3);
        assert!(config.embedding.max_workers() >= 1);
        assert!(config.vocabulary.path().is_none());
        assert!(config.report.dir.is_none());

        let extract = config.extract.to_extract_config();
        assert_eq!(extract.min_paragraph_chars, 50);
        assert_eq!(extract.skip_sections.len(), 4);
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[vocabulary]
path = "glove.6B.100d.txt"

[embedding]
max_workers = 2

[retrieval]
workers = 8
top_k = 5

[extract]
min_paragraph_chars = 10
skip_sections = ["Notes"]

[report]
dir = "logs"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(
            config.vocabulary.path(),
            Some(Path::new("glove.6B.100d.txt"))
        );
        assert_eq!(config.embedding.max_workers(), 2);
        assert_eq!(config.retrieval.workers(), 8);
        assert_eq!(config.retrieval.top_k(), 5);
        assert_eq!(config.report.dir.as_deref(), Some(Path::new("logs")));

        let extract = config.extract.to_extract_config();
        assert_eq!(extract.min_paragraph_chars, 10);
        assert_eq!(extract.skip_sections, vec!["notes".to_string()]);
    }

    #[test]
    fn test_zero_workers_fall_back() {
        let config: Config = toml::from_str("[retrieval]\nworkers = 0\n").unwrap();
        assert_eq!(config.retrieval.workers(), 4);
    }

    #[test]
    fn test_invalid_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "retrieval = [").unwrap();
        assert!(Config::load_from_path(&path).is_none());
        assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let config: Config =
            toml::from_str("[vocabulary]\npath = \"a.txt\"\n[retrieval]\ntop_k = 7\n").unwrap();
        assert_eq!(config.merge_top_k(None), 7);
        assert_eq!(config.merge_top_k(Some(1)), 1);
        assert_eq!(
            config.merge_vocabulary(Some(Path::new("b.txt"))),
            Some(PathBuf::from("b.txt"))
        );
        assert_eq!(config.merge_vocabulary(None), Some(PathBuf::from("a.txt")));
    }
}
