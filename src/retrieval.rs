// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-k passage retrieval by cosine similarity.
//!
//! The table is split into contiguous batches that are scored concurrently.
//! Partial results are concatenated in batch order and stable-sorted by
//! score, so equal scores keep table order whatever the worker count.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::embedding::{Chunk, EmbeddingTable};
use crate::errors::EngineError;
use crate::pool;

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    /// Cosine similarity in [-1, 1]; exactly 0 when either vector is zero
    #[serde(rename = "similarity")]
    pub score: f32,
}

/// Retrieval settings
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Number of scoring workers (clipped to the table size per call)
    pub workers: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            workers: pool::DEFAULT_RETRIEVAL_WORKERS,
        }
    }
}

impl RetrievalConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

/// Scores a query against an embedding table and returns the best matches.
pub struct RetrievalEngine {
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RetrievalConfig::default())
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Returns the `top_k` chunks most similar to `query`.
    ///
    /// Ids without an entry in `chunk_texts` are dropped after selection and
    /// do not count toward `top_k`, so fewer than `top_k` results may be
    /// returned. Failure to start the worker pool is logged and yields no
    /// results.
    pub fn retrieve(
        &self,
        table: &EmbeddingTable,
        chunk_texts: &HashMap<String, String>,
        query: &[f32],
        top_k: usize,
    ) -> Vec<ScoredChunk> {
        match self.try_retrieve(table, chunk_texts, query, top_k) {
            Ok(results) => results,
            Err(err) => {
                error!("Retrieval failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Same as [`RetrievalEngine::retrieve`], surfacing pool start failures.
    pub fn try_retrieve(
        &self,
        table: &EmbeddingTable,
        chunk_texts: &HashMap<String, String>,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, EngineError> {
        if table.is_empty() {
            warn!("No embeddings available for retrieval");
            return Ok(Vec::new());
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let scores = self.score_all(table, query)?;
        let ranked = rank(scores, top_k);

        let results: Vec<ScoredChunk> = ranked
            .into_iter()
            .filter_map(|(id, score)| {
                chunk_texts.get(id).map(|text| ScoredChunk {
                    id: id.to_string(),
                    text: text.clone(),
                    score,
                })
            })
            .collect();

        info!("Retrieved {} documents", results.len());
        Ok(results)
    }

    /// Scores every table entry against `query`, in batch order.
    ///
    /// Entries whose dimension differs from the query are skipped.
    pub fn score_all<'a>(
        &self,
        table: &'a EmbeddingTable,
        query: &[f32],
    ) -> Result<Vec<(&'a str, f32)>, EngineError> {
        let entries = table.entries();
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let workers = pool::worker_count(self.config.workers, entries.len());
        debug!(
            "Scoring {} vectors in {} batches",
            entries.len(),
            workers
        );

        let scoring_pool = pool::build_pool(workers, "score")?;
        let batches = pool::run_batches(&scoring_pool, entries, workers, |batch| {
            score_batch(batch, query)
        });

        Ok(batches.into_iter().flatten().collect())
    }
}

/// Scores one batch, preserving the batch's order.
fn score_batch<'a>(batch: &'a [(String, Vec<f32>)], query: &[f32]) -> Vec<(&'a str, f32)> {
    batch
        .iter()
        .filter_map(|(id, vector)| match similarity_for(id, vector, query) {
            Ok(score) => Some((id.as_str(), score)),
            Err(err) => {
                warn!("Skipping {}", err);
                None
            }
        })
        .collect()
}

fn similarity_for(id: &str, vector: &[f32], query: &[f32]) -> Result<f32, EngineError> {
    if vector.len() != query.len() {
        return Err(EngineError::DimensionMismatch {
            id: id.to_string(),
            expected: query.len(),
            found: vector.len(),
        });
    }
    Ok(cosine(vector, query))
}

/// Stable sort by descending score, then truncate to `top_k`.
fn rank(mut scores: Vec<(&str, f32)>, top_k: usize) -> Vec<(&str, f32)> {
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scores.truncate(top_k);
    scores
}

/// Cosine similarity between two vectors of equal dimension.
///
/// Returns exactly 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EngineError> {
    if a.len() != b.len() {
        return Err(EngineError::DimensionMismatch {
            id: String::new(),
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(cosine(a, b))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Builds the id to text lookup used by [`RetrievalEngine::retrieve`].
pub fn chunk_texts(chunks: &[Chunk]) -> HashMap<String, String> {
    chunks
        .iter()
        .map(|chunk| (chunk.id.clone(), chunk.text.clone()))
        .collect()
}
