//! Core data models used throughout readme-rag.
//!
//! These types represent the documents, chunks, and index records that flow
//! through the indexing and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// An uploaded document. Read once per upload and never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub text: String,
}

impl Document {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }
}

/// A contiguous slice of a [`Document`].
///
/// `start` and `end` are character offsets (not bytes) into the document
/// text, with `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: usize,
    pub file_name: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }

    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            text: self.text.clone(),
            file_name: self.file_name.clone(),
            chunk_id: self.chunk_id,
        }
    }
}

/// Metadata stored beside every vector in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    pub file_name: String,
    pub chunk_id: usize,
}

/// An `(id, vector, metadata)` triple ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Restricts a query to vectors whose metadata matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub file_name: Option<String>,
}

impl MetadataFilter {
    pub fn file_name(name: impl Into<String>) -> Self {
        Self {
            file_name: Some(name.into()),
        }
    }

    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match &self.file_name {
            Some(name) => metadata.file_name == *name,
            None => true,
        }
    }
}

/// A nearest-neighbour query against a [`VectorIndex`](crate::index::VectorIndex).
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
}

/// One hit returned by a vector index query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    pub id: String,
    /// Similarity score; higher is closer.
    pub score: f32,
    pub metadata: ChunkMetadata,
}
