//! Vector index selection.

use anyhow::{bail, Result};
use std::sync::Arc;

use readme_rag_core::index::memory::InMemoryIndex;
use readme_rag_core::index::VectorIndex;

use crate::config::{require_env, IndexConfig};
use crate::pinecone::PineconeIndex;

/// Create the configured [`VectorIndex`].
///
/// | Config Value | Index |
/// |-------------|-------|
/// | `"pinecone"` | [`PineconeIndex`] (needs `PINECONE_API_KEY`) |
/// | `"memory"` | [`InMemoryIndex`], lost on exit |
pub async fn create_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.provider.as_str() {
        "pinecone" => {
            let api_key = require_env("PINECONE_API_KEY")?;
            Ok(Arc::new(PineconeIndex::connect(config, api_key).await?))
        }
        "memory" => Ok(Arc::new(InMemoryIndex::new(config.name.clone()))),
        other => bail!("Unknown index provider: {}", other),
    }
}
