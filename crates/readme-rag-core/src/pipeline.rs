//! Indexing pipeline: chunk → embed → batched upsert.
//!
//! [`index_document`] is the one entry point. It validates its options
//! before touching any collaborator, then works strictly sequentially:
//! embedding batches one after another, then upsert batches one after
//! another. A failure aborts the run; batches already upserted stay in the
//! index.

use tracing::{debug, info};
use uuid::Uuid;

use crate::chunk::{chunk_document, ChunkConfig};
use crate::embedding::Embedder;
use crate::error::{ConfigError, IndexingError};
use crate::index::VectorIndex;
use crate::models::{Document, VectorRecord};

/// Number of records sent per upsert call.
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;
/// Number of chunk texts sent per embedding call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Tuning for [`index_document`].
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub chunking: ChunkConfig,
    pub embed_batch_size: usize,
    pub upsert_batch_size: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }
}

impl IndexOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Re-check the chunking pair even though ChunkConfig guards it.
        ChunkConfig::new(self.chunking.chunk_size(), self.chunking.overlap())?;
        if self.embed_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize {
                name: "embed_batch_size",
            });
        }
        if self.upsert_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize {
                name: "upsert_batch_size",
            });
        }
        Ok(())
    }
}

/// Summary of one [`index_document`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub file_name: String,
    pub chunks: usize,
    pub vectors_upserted: usize,
    /// Upsert calls made against the index.
    pub batches: usize,
}

/// Build the index id for one chunk: `{file_name}-{uuid}`.
pub fn record_id(file_name: &str) -> String {
    format!("{}-{}", file_name, Uuid::new_v4())
}

/// Chunk, embed, and upsert a document.
///
/// # Errors
///
/// - [`IndexingError::Config`] for invalid options, before any I/O.
/// - [`IndexingError::Embedding`], [`IndexingError::EmbeddingCount`], or
///   [`IndexingError::EmbeddingDims`] if the embedder fails or returns the
///   wrong shape. Nothing has been upserted at that point.
/// - [`IndexingError::Upsert`] if the index rejects a batch.
pub async fn index_document(
    document: &Document,
    options: &IndexOptions,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
) -> Result<IndexReport, IndexingError> {
    options.validate()?;

    let chunks = chunk_document(document, &options.chunking);
    debug!(
        file_name = %document.file_name,
        chunks = chunks.len(),
        "chunked document"
    );

    if chunks.is_empty() {
        info!(file_name = %document.file_name, "document is empty, nothing to index");
        return Ok(IndexReport {
            file_name: document.file_name.clone(),
            chunks: 0,
            vectors_upserted: 0,
            batches: 0,
        });
    }

    let expected_dims = embedder.dims();
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

    for (batch, group) in chunks.chunks(options.embed_batch_size).enumerate() {
        let texts: Vec<String> = group.iter().map(|c| c.text.clone()).collect();
        let embedded = embedder
            .embed_documents(&texts)
            .await
            .map_err(|source| IndexingError::Embedding { batch, source })?;

        if embedded.len() != texts.len() {
            return Err(IndexingError::EmbeddingCount {
                batch,
                expected: texts.len(),
                got: embedded.len(),
            });
        }
        if expected_dims > 0 {
            if let Some(bad) = embedded.iter().find(|v| v.len() != expected_dims) {
                return Err(IndexingError::EmbeddingDims {
                    expected: expected_dims,
                    got: bad.len(),
                });
            }
        }
        vectors.extend(embedded);
    }

    let records: Vec<VectorRecord> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, values)| VectorRecord {
            id: record_id(&chunk.file_name),
            values,
            metadata: chunk.metadata(),
        })
        .collect();

    let mut batches = 0;
    for (batch, group) in records.chunks(options.upsert_batch_size).enumerate() {
        index
            .upsert(group)
            .await
            .map_err(|source| IndexingError::Upsert {
                index: index.name().to_string(),
                batch,
                source,
            })?;
        batches += 1;
        debug!(index = index.name(), batch, size = group.len(), "upserted batch");
    }

    info!(
        file_name = %document.file_name,
        index = index.name(),
        chunks = chunks.len(),
        batches,
        "indexed document"
    );

    Ok(IndexReport {
        file_name: document.file_name.clone(),
        chunks: chunks.len(),
        vectors_upserted: records.len(),
        batches,
    })
}
