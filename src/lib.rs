// SPDX-License-Identifier: MIT OR Apache-2.0

//! wikirag - Parallel embedding and retrieval library
//!
//! Shared modules for the wikirag CLI tool.

pub mod config;
pub mod embedding;
pub mod errors;
pub mod extract;
pub mod output;
pub mod pool;
pub mod report;
pub mod retrieval;
pub mod text;

pub use embedding::{Chunk, EmbeddingEngine, EmbeddingTable, Vector, Vocabulary};
pub use errors::{EngineError, VocabularyError};
pub use retrieval::{RetrievalConfig, RetrievalEngine, ScoredChunk};
