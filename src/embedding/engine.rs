// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parallel chunk embedding.
//!
//! Each chunk is embedded as the component-wise mean of the vocabulary
//! vectors of its tokens. Chunks are split into contiguous slices and
//! embedded on a bounded worker pool; the only shared state is the
//! read-only [`Vocabulary`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::embedding::table::{Chunk, EmbeddingTable, Vector};
use crate::embedding::vocabulary::{Vocabulary, VocabularyLoader};
use crate::errors::EngineError;
use crate::pool;
use crate::text::simple_tokens;

/// Id given to the synthetic chunk used for query embedding.
pub const QUERY_CHUNK_ID: &str = "query";

enum VocabularySource {
    Loaded(Arc<Vocabulary>),
    Lazy {
        loader: Box<dyn VocabularyLoader>,
        cell: OnceCell<Arc<Vocabulary>>,
    },
}

/// Converts chunks into embedding vectors.
pub struct EmbeddingEngine {
    source: VocabularySource,
    max_workers: usize,
}

impl EmbeddingEngine {
    /// Creates an engine around an already loaded vocabulary.
    pub fn with_vocabulary(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            source: VocabularySource::Loaded(vocabulary),
            max_workers: pool::available_workers(),
        }
    }

    /// Creates an engine that loads its vocabulary on first use.
    ///
    /// A failed load is retried on the next call.
    pub fn with_loader<L: VocabularyLoader + 'static>(loader: L) -> Self {
        Self {
            source: VocabularySource::Lazy {
                loader: Box::new(loader),
                cell: OnceCell::new(),
            },
            max_workers: pool::available_workers(),
        }
    }

    /// Caps the number of embedding workers (defaults to available parallelism).
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns true once a vocabulary is available without loading.
    pub fn is_loaded(&self) -> bool {
        match &self.source {
            VocabularySource::Loaded(_) => true,
            VocabularySource::Lazy { cell, .. } => cell.get().is_some(),
        }
    }

    /// Returns the vocabulary, loading it if needed.
    pub fn vocabulary(&self) -> Result<Arc<Vocabulary>, EngineError> {
        match &self.source {
            VocabularySource::Loaded(vocabulary) => Ok(Arc::clone(vocabulary)),
            VocabularySource::Lazy { loader, cell } => cell
                .get_or_try_init(|| {
                    info!("Loading vocabulary: {}", loader.describe());
                    loader.load().map(Arc::new)
                })
                .map(Arc::clone)
                .map_err(EngineError::from),
        }
    }

    /// Embeds `chunks`, reporting a vocabulary load failure as an error.
    ///
    /// Chunks that fail individually are logged and left out of the table.
    pub fn try_create_embeddings(&self, chunks: &[Chunk]) -> Result<EmbeddingTable, EngineError> {
        let vocabulary = self.vocabulary()?;

        if chunks.is_empty() {
            warn!("No chunks provided for embedding creation");
            return Ok(EmbeddingTable::new());
        }

        let workers = pool::worker_count(self.max_workers, chunks.len());
        info!(
            "Creating embeddings for {} chunks using {} workers",
            chunks.len(),
            workers
        );

        let workers_pool = pool::build_pool(workers, "embed")?;
        let batches = pool::run_batches(&workers_pool, chunks, workers, |batch| {
            batch
                .iter()
                .map(|chunk| (chunk.id.as_str(), embed_chunk(&vocabulary, chunk)))
                .collect::<Vec<_>>()
        });

        let mut failed = 0usize;
        let table: EmbeddingTable = batches
            .into_iter()
            .flatten()
            .filter_map(|(id, outcome)| match outcome {
                Ok(vector) => Some((id, vector)),
                Err(err) => {
                    warn!("{}", err);
                    failed += 1;
                    None
                }
            })
            .collect();

        info!(
            "Created embeddings for {} chunks ({} failed)",
            table.len(),
            failed
        );
        Ok(table)
    }

    /// Embeds `chunks`.
    ///
    /// A vocabulary load failure is logged and yields an empty table.
    pub fn create_embeddings(&self, chunks: &[Chunk]) -> EmbeddingTable {
        match self.try_create_embeddings(chunks) {
            Ok(table) => table,
            Err(err) => {
                error!("Embedding stage failed: {}", err);
                EmbeddingTable::new()
            }
        }
    }

    /// Embeds query text as a single synthetic chunk.
    pub fn embed_query(&self, text: &str) -> Option<Vector> {
        let chunks = [Chunk::new(QUERY_CHUNK_ID, text)];
        self.create_embeddings(&chunks).into_vector(QUERY_CHUNK_ID)
    }
}

/// Embeds one chunk against `vocabulary`.
///
/// Unresolved tokens are ignored; a chunk with no resolved token gets the
/// all-zero vector.
pub fn embed_chunk(vocabulary: &Vocabulary, chunk: &Chunk) -> Result<Vector, EngineError> {
    if let Some(reason) = encoding_fault(&chunk.text) {
        return Err(EngineError::ChunkEncoding {
            id: chunk.id.clone(),
            reason: reason.to_string(),
        });
    }

    let dimension = vocabulary.dimension();
    let mut sum = vec![0.0f32; dimension];
    let mut resolved = 0usize;

    for token in simple_tokens(&chunk.text) {
        if let Some(vector) = vocabulary.get(&token) {
            for (acc, value) in sum.iter_mut().zip(vector) {
                *acc += value;
            }
            resolved += 1;
        }
    }

    if resolved == 0 {
        debug!("No vocabulary tokens in chunk {}", chunk.id);
        return Ok(sum);
    }

    let count = resolved as f32;
    for value in sum.iter_mut() {
        *value /= count;
    }

    if sum.iter().any(|v| !v.is_finite()) {
        return Err(EngineError::ChunkEncoding {
            id: chunk.id.clone(),
            reason: "embedding has non-finite components".to_string(),
        });
    }

    Ok(sum)
}

fn encoding_fault(text: &str) -> Option<&'static str> {
    if text.contains('\u{FFFD}') {
        Some("text contains undecodable bytes")
    } else if text.contains('\0') {
        Some("text contains NUL bytes")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::vocabulary::TextFileLoader;
    use crate::errors::VocabularyError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_vocabulary() -> Arc<Vocabulary> {
        Arc::new(
            Vocabulary::from_entries([
                ("cat", vec![1.0, 0.0, 0.0]),
                ("dog", vec![0.0, 1.0, 0.0]),
                ("fish", vec![0.0, 0.0, 1.0]),
                ("big", vec![f32::MAX, 0.0, 0.0]),
            ])
            .unwrap(),
        )
    }

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("para-0", "The cat chased the dog."),
            Chunk::new("para-1", "A fish!"),
            Chunk::new("para-2", "Nothing known here"),
            Chunk::new("para-3", "cat cat dog"),
        ]
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_embed_chunk_mean() {
        let vocab = test_vocabulary();
        let vector = embed_chunk(&vocab, &Chunk::new("c", "cat dog")).unwrap();
        assert_close(&vector, &[0.5, 0.5, 0.0]);

        let vector = embed_chunk(&vocab, &Chunk::new("c", "cat cat dog")).unwrap();
        assert_close(&vector, &[2.0 / 3.0, 1.0 / 3.0, 0.0]);
    }

    #[test]
    fn test_embed_chunk_no_tokens_is_zero_vector() {
        let vocab = test_vocabulary();
        let vector = embed_chunk(&vocab, &Chunk::new("x", "zzz999")).unwrap();
        assert_eq!(vector, vec![0.0; 3]);
    }

    #[test]
    fn test_embed_chunk_encoding_fault() {
        let vocab = test_vocabulary();
        let err = embed_chunk(&vocab, &Chunk::new("bad", "cat \u{FFFD} dog")).unwrap_err();
        assert!(matches!(err, EngineError::ChunkEncoding { ref id, .. } if id == "bad"));

        let err = embed_chunk(&vocab, &Chunk::new("nul", "cat\0dog")).unwrap_err();
        assert!(err.is_per_item());
    }

    #[test]
    fn test_embed_chunk_overflow_is_failure() {
        let vocab = test_vocabulary();
        let err = embed_chunk(&vocab, &Chunk::new("o", "big big")).unwrap_err();
        assert!(matches!(err, EngineError::ChunkEncoding { .. }));
    }

    #[test]
    fn test_max_workers_is_at_least_one() {
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary());
        assert!(engine.max_workers() >= 1);
        assert_eq!(engine.with_max_workers(0).max_workers(), 1);
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary()).with_max_workers(6);
        assert_eq!(engine.max_workers(), 6);
    }

    #[test]
    fn test_create_embeddings() {
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary());
        let chunks = sample_chunks();
        let table = engine.create_embeddings(&chunks);

        assert_eq!(table.len(), 4);
        assert!(table.iter().all(|(_, v)| v.len() == 3));
        assert_close(table.get("para-0").unwrap(), &[0.5, 0.5, 0.0]);
        assert_close(table.get("para-1").unwrap(), &[0.0, 0.0, 1.0]);
        assert_eq!(table.get("para-2").unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(
            table.ids().collect::<Vec<_>>(),
            vec!["para-0", "para-1", "para-2", "para-3"]
        );
    }

    #[test]
    fn test_failed_chunk_is_omitted() {
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary());
        let chunks = vec![
            Chunk::new("ok", "cat"),
            Chunk::new("broken", "dog\u{FFFD}"),
            Chunk::new("empty", "1234"),
        ];
        let table = engine.create_embeddings(&chunks);
        assert_eq!(table.len(), 2);
        assert!(table.contains("ok"));
        assert!(!table.contains("broken"));
        assert!(table.contains("empty"));
    }

    #[test]
    fn test_empty_input() {
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary());
        assert!(engine.create_embeddings(&[]).is_empty());
    }

    #[test]
    fn test_worker_count_does_not_change_vectors() {
        let chunks: Vec<Chunk> = (0..37)
            .map(|i| {
                let words = ["cat", "dog", "fish", "owl"];
                let text = (0..=i % 5)
                    .map(|j| words[(i + j) % words.len()])
                    .collect::<Vec<_>>()
                    .join(" ");
                Chunk::new(format!("para-{}", i), text)
            })
            .collect();

        let single = EmbeddingEngine::with_vocabulary(test_vocabulary())
            .with_max_workers(1)
            .create_embeddings(&chunks);
        let many = EmbeddingEngine::with_vocabulary(test_vocabulary())
            .with_max_workers(8)
            .create_embeddings(&chunks);

        assert_eq!(single.len(), many.len());
        for (id, vector) in single.iter() {
            assert_close(vector, many.get(id).unwrap());
        }
        assert_eq!(
            single.ids().collect::<Vec<_>>(),
            many.ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_embed_query() {
        let engine = EmbeddingEngine::with_vocabulary(test_vocabulary());
        let query = engine.embed_query("Where is the fish?").unwrap();
        assert_close(&query, &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_vocabulary_load_failure_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let engine = EmbeddingEngine::with_loader(TextFileLoader::new(dir.path().join("nope.txt")));

        let table = engine.create_embeddings(&sample_chunks());
        assert!(table.is_empty());
        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.try_create_embeddings(&sample_chunks()),
            Err(EngineError::VocabularyLoad(VocabularyError::Io { .. }))
        ));
        assert!(engine.embed_query("cat").is_none());
    }

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    impl VocabularyLoader for CountingLoader {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn load(&self) -> Result<Vocabulary, VocabularyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Vocabulary::from_entries([("cat", vec![1.0, 2.0])])
        }
    }

    #[test]
    fn test_lazy_loader_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = EmbeddingEngine::with_loader(CountingLoader {
            calls: Arc::clone(&calls),
        });
        assert!(!engine.is_loaded());

        engine.create_embeddings(&[Chunk::new("a", "cat")]);
        engine.create_embeddings(&[Chunk::new("b", "cat")]);
        assert!(engine.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
