// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only token to vector lookup.
//!
//! Vocabularies are loaded from GloVe / word2vec text files: one entry per
//! line, `token v1 v2 ... vD`. A leading `<count> <dim>` header line is
//! accepted and skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::VocabularyError;

/// Immutable mapping from lowercase token to a vector of fixed dimension.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl Vocabulary {
    /// Builds a vocabulary from in-memory entries.
    ///
    /// Every vector must share the dimension of the first one. Tokens are
    /// lowercased and the first occurrence of a token wins.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut dimension = None;
        let mut vectors = HashMap::new();

        for (idx, (token, vector)) in entries.into_iter().enumerate() {
            if vector.is_empty() {
                return Err(VocabularyError::Parse {
                    line: idx + 1,
                    reason: "vector has no components".to_string(),
                });
            }
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(VocabularyError::InconsistentDimension {
                    line: idx + 1,
                    expected,
                    found: vector.len(),
                });
            }
            vectors
                .entry(token.into().to_lowercase())
                .or_insert(vector);
        }

        match dimension {
            Some(dimension) => Ok(Self {
                dimension,
                vectors,
            }),
            None => Err(VocabularyError::Empty),
        }
    }

    /// Parses a GloVe / word2vec text vocabulary.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, VocabularyError> {
        let mut dimension: Option<usize> = None;
        let mut vectors = HashMap::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| VocabularyError::Parse {
                line: line_no,
                reason: e.to_string(),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            if line_no == 1 && is_word2vec_header(token, &values) {
                debug!("Skipping word2vec header: {}", line);
                continue;
            }

            let vector = values
                .iter()
                .map(|raw| {
                    raw.parse::<f32>().map_err(|_| VocabularyError::Parse {
                        line: line_no,
                        reason: format!("invalid component '{}' for token '{}'", raw, token),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;

            if vector.is_empty() {
                return Err(VocabularyError::Parse {
                    line: line_no,
                    reason: format!("token '{}' has no vector components", token),
                });
            }

            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(VocabularyError::InconsistentDimension {
                    line: line_no,
                    expected,
                    found: vector.len(),
                });
            }

            vectors.entry(token.to_lowercase()).or_insert(vector);
        }

        match dimension {
            Some(dimension) => Ok(Self {
                dimension,
                vectors,
            }),
            None => Err(VocabularyError::Empty),
        }
    }

    /// Loads a vocabulary file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let vocabulary = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded vocabulary {} ({} tokens, dimension {})",
            path.display(),
            vocabulary.len(),
            vocabulary.dimension()
        );
        Ok(vocabulary)
    }

    /// Vector dimension D shared by every entry.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Looks up a token. A miss is not an error.
    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.vectors.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn is_word2vec_header(first: &str, rest: &[&str]) -> bool {
    rest.len() == 1 && first.parse::<usize>().is_ok() && rest[0].parse::<usize>().is_ok()
}

/// Source of a [`Vocabulary`] that the embedding engine loads on first use.
pub trait VocabularyLoader: Send + Sync {
    /// Human readable description used in log messages.
    fn describe(&self) -> String;

    /// Loads the vocabulary.
    fn load(&self) -> Result<Vocabulary, VocabularyError>;
}

/// Loads a GloVe / word2vec text file.
#[derive(Debug, Clone)]
pub struct TextFileLoader {
    path: PathBuf,
}

impl TextFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VocabularyLoader for TextFileLoader {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vocabulary, VocabularyError> {
        Vocabulary::load(&self.path)
    }
}
