//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the seam between the pipeline and whatever
//! stores the vectors: a hosted service in production, [`memory::InMemoryIndex`]
//! in tests and offline runs.
//!
//! Implementations must be `Send + Sync` to be shared across request handlers.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{QueryMatch, QueryRequest, VectorRecord};

/// Abstract vector index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorIndex::upsert) | Insert or replace records by id |
/// | [`query`](VectorIndex::query) | Top-k nearest neighbours, optionally filtered |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Insert or replace a batch of records.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Return at most `top_k` matches, best first.
    async fn query(&self, request: &QueryRequest) -> Result<Vec<QueryMatch>>;
}
