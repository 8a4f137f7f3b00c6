// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable chunk id to vector table produced by the embedding engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed-length embedding vector.
pub type Vector = Vec<f32>;

/// A unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier, unique within a batch
    pub id: String,
    /// Cleaned chunk text
    pub text: String,
}

impl Chunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Mapping from chunk id to embedding vector.
///
/// Entries keep the order in which they were inserted (the input chunk
/// order), which fixes the batch layout used during retrieval. The table
/// cannot be modified once built.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    entries: Vec<(String, Vector)>,
    index: HashMap<String, usize>,
}

impl EmbeddingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of embedded chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the vector stored for `id`.
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.index
            .get(id)
            .map(|&idx| self.entries[idx].1.as_slice())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates over ids in table order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Iterates over `(id, vector)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries
            .iter()
            .map(|(id, vector)| (id.as_str(), vector.as_slice()))
    }

    /// Entries as a slice, in table order.
    pub fn entries(&self) -> &[(String, Vector)] {
        &self.entries
    }

    /// Consumes the table and returns the vector stored for `id`.
    pub fn into_vector(mut self, id: &str) -> Option<Vector> {
        let idx = self.index.remove(id)?;
        Some(self.entries.swap_remove(idx).1)
    }
}

impl<S: Into<String>> FromIterator<(S, Vector)> for EmbeddingTable {
    /// Duplicate ids are a producer bug; the first entry is kept.
    fn from_iter<I: IntoIterator<Item = (S, Vector)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, vector) in iter {
            let id = id.into();
            if table.index.contains_key(&id) {
                continue;
            }
            table.index.insert(id.clone(), table.entries.len());
            table.entries.push((id, vector));
        }
        table
    }
}
