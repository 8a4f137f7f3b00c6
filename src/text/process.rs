// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-retrieval text normalization.
//!
//! Retrieved chunks are reduced to lowercase content words: stopwords and
//! anything that is not purely alphabetic are dropped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::retrieval::ScoredChunk;
use crate::text::word_tokens;

/// English stopwords (NLTK list).
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

/// A retrieved chunk after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChunk {
    pub id: String,
    pub original_text: String,
    /// Content words joined by single spaces
    pub processed_text: String,
    pub token_count: usize,
    pub similarity: f32,
}

/// Normalizes retrieved chunks for downstream consumption.
pub struct TextProcessor {
    stopwords: &'static HashSet<&'static str>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stopwords: &STOPWORDS,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Normalizes a single chunk.
    pub fn process_chunk(&self, chunk: &ScoredChunk) -> ProcessedChunk {
        let tokens: Vec<String> = word_tokens(&chunk.text)
            .into_iter()
            .map(|token| token.to_lowercase())
            .filter(|token| !self.is_stopword(token))
            .collect();

        ProcessedChunk {
            id: chunk.id.clone(),
            original_text: chunk.text.clone(),
            processed_text: tokens.join(" "),
            token_count: tokens.len(),
            similarity: chunk.score,
        }
    }

    /// Normalizes chunks in parallel, keeping their order.
    pub fn process_chunks(&self, chunks: &[ScoredChunk]) -> Vec<ProcessedChunk> {
        if chunks.is_empty() {
            warn!("No chunks provided for processing");
            return Vec::new();
        }

        let processed: Vec<ProcessedChunk> = chunks
            .par_iter()
            .map(|chunk| self.process_chunk(chunk))
            .collect();

        info!("Processed {} chunks", processed.len());
        processed
    }
}
