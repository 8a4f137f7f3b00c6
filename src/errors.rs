// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the embedding and retrieval engines.
//!
//! Only [`EngineError::VocabularyLoad`] is fatal to a stage. The per-item
//! variants are logged and contained inside the engine that raised them.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading a vocabulary resource.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read vocabulary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed vocabulary entry on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("vocabulary line {line} has dimension {found}, expected {expected}")]
    InconsistentDimension {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("vocabulary contains no vectors")]
    Empty,
}

/// Errors raised by the embedding and retrieval engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The vocabulary could not be loaded; the whole embedding call fails.
    #[error("vocabulary load failed: {0}")]
    VocabularyLoad(#[from] VocabularyError),

    /// The worker pool for a parallel stage could not be started.
    #[error("worker pool unavailable: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A single chunk could not be embedded and is omitted from the table.
    #[error("chunk {id} could not be embedded: {reason}")]
    ChunkEncoding { id: String, reason: String },

    /// A stored vector does not match the query dimension.
    #[error("vector for {id} has dimension {found}, query has {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        found: usize,
    },
}

impl EngineError {
    /// Returns true when the error only affects a single item.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            EngineError::ChunkEncoding { .. } | EngineError::DimensionMismatch { .. }
        )
    }
}
