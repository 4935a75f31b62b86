//! Error types for the chunking, indexing, and answering pipelines.

/// Invalid chunking parameters. Raised before any text is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },

    #[error("{name} must be > 0")]
    ZeroBatchSize { name: &'static str },
}

/// A document could not be indexed.
///
/// Everything except [`IndexingError::Config`] is a failure of an external
/// collaborator (embedding model or vector index).
#[derive(Debug, thiserror::Error)]
pub enum IndexingError {
    #[error("invalid chunking configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("indexing failed: embedding batch {batch} failed: {source:#}")]
    Embedding {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("indexing failed: embedding batch {batch} returned {got} vectors for {expected} chunks")]
    EmbeddingCount {
        batch: usize,
        expected: usize,
        got: usize,
    },

    #[error("indexing failed: expected {expected}-dimensional vectors, got {got}")]
    EmbeddingDims { expected: usize, got: usize },

    #[error("indexing failed: upsert batch {batch} into '{index}' failed: {source:#}")]
    Upsert {
        index: String,
        batch: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// A question could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("file_name must not be empty")]
    EmptyFileName,

    #[error("top_k must be > 0")]
    ZeroTopK,

    #[error("failed to embed question: {0:#}")]
    Embedding(#[source] anyhow::Error),

    #[error("vector index query failed: {0:#}")]
    Query(#[source] anyhow::Error),

    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

impl AnswerError {
    /// True for errors caused by the caller's input rather than a collaborator.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AnswerError::EmptyQuestion | AnswerError::EmptyFileName | AnswerError::ZeroTopK
        )
    }
}
