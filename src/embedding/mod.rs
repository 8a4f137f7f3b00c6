// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns text chunks into word-vector embeddings
//!
//! A chunk embedding is the mean of the vocabulary vectors of its tokens.
//! The vocabulary is loaded once and shared read-only by every worker.

pub mod engine;
pub mod table;
pub mod vocabulary;

pub use engine::{embed_chunk, EmbeddingEngine, QUERY_CHUNK_ID};
pub use table::{Chunk, EmbeddingTable, Vector};
pub use vocabulary::{TextFileLoader, Vocabulary, VocabularyLoader};
