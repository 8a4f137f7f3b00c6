// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text utilities shared by the embedding engine and the post-retrieval
//! processing stage.

pub mod process;
pub mod tokenize;

pub use process::{ProcessedChunk, TextProcessor};
pub use tokenize::{simple_tokens, word_tokens};
