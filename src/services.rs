//! The external collaborators, constructed once per process.
//!
//! Commands and the HTTP server receive a [`Services`] value instead of
//! reaching for process-wide clients.

use anyhow::{bail, Result};
use std::sync::Arc;

use readme_rag_core::answer::Generator;
use readme_rag_core::embedding::Embedder;
use readme_rag_core::index::VectorIndex;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::{create_generator, DisabledGenerator};
use crate::index::create_index;

#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub generator: Arc<dyn Generator>,
}

impl Services {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
        }
    }

    /// Build every collaborator the config names.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding).await?;
        check_dims(embedder.as_ref(), config)?;
        let index = create_index(&config.index).await?;
        let generator = create_generator(&config.generation)?;
        Ok(Self::new(embedder, index, generator))
    }

    /// Like [`Services::from_config`] but without a generator, for commands
    /// that only write to the index.
    pub async fn for_indexing(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding).await?;
        check_dims(embedder.as_ref(), config)?;
        let index = create_index(&config.index).await?;
        Ok(Self::new(embedder, index, Arc::new(DisabledGenerator)))
    }
}

/// The embedder's output must fit the index.
fn check_dims(embedder: &dyn Embedder, config: &Config) -> Result<()> {
    let dims = embedder.dims();
    if dims > 0 && dims != config.index.dims {
        bail!(
            "embedding model '{}' produces {}-dimensional vectors, but index.dims is {}",
            embedder.model_name(),
            dims,
            config.index.dims
        );
    }
    Ok(())
}
