//! In-memory [`VectorIndex`] implementation for testing and offline use.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Queries are
//! brute-force cosine similarity over every record that passes the filter.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{QueryMatch, QueryRequest, VectorRecord};

use super::VectorIndex;

/// In-memory vector index.
pub struct InMemoryIndex {
    name: String,
    records: RwLock<Vec<VectorRecord>>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored records, in insertion order.
    pub fn records(&self) -> Vec<VectorRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        for record in records {
            stored.retain(|r| r.id != record.id);
            stored.push(record.clone());
        }
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<QueryMatch>> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        let mut matches: Vec<QueryMatch> = stored
            .iter()
            .filter(|r| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |f| f.matches(&r.metadata))
            })
            .map(|r| QueryMatch {
                id: r.id.clone(),
                score: cosine_similarity(&request.vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(request.top_k);
        Ok(matches)
    }
}
