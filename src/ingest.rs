//! Indexing commands: `rag chunk` and `rag index`.
//!
//! Both read a UTF-8 file from disk. `rag chunk` only runs the chunker and
//! prints the resulting spans; `rag index` runs the full pipeline against
//! the configured embedder and vector index.

use anyhow::{Context, Result};
use std::path::Path;

use readme_rag_core::chunk::chunk_document;
use readme_rag_core::models::Document;
use readme_rag_core::pipeline::{index_document, IndexOptions, IndexReport};

use crate::config::Config;
use crate::services::Services;

/// Read a document from disk. The file name defaults to the path's final
/// component, which is what the index filters on later.
pub fn read_document(path: &Path, file_name: Option<&str>) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} as UTF-8 text", path.display()))?;
    let file_name = match file_name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Cannot derive a file name from {}", path.display()))?,
    };
    Ok(Document::new(file_name, text))
}

/// Print chunk spans without calling any external service.
pub fn run_chunk(config: &Config, path: &Path) -> Result<()> {
    let chunking = config.chunk_config()?;
    let document = read_document(path, None)?;
    let chunks = chunk_document(&document, &chunking);

    println!("chunk {}", document.file_name);
    println!(
        "  chunk_size: {}  overlap: {}",
        chunking.chunk_size(),
        chunking.overlap()
    );
    println!("  characters: {}", document.text.chars().count());
    println!("  chunks: {}", chunks.len());
    for chunk in &chunks {
        let preview: String = chunk
            .text
            .chars()
            .take(48)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        println!(
            "  [{:>3}] {:>6}..{:<6} ({:>4} chars) {}",
            chunk.chunk_id,
            chunk.start,
            chunk.end,
            chunk.char_len(),
            preview
        );
    }
    Ok(())
}

/// Chunk, embed, and upsert one file.
pub async fn run_index(
    config: &Config,
    path: &Path,
    file_name: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let options = config.index_options()?;
    let document = read_document(path, file_name)?;

    if dry_run {
        let chunks = chunk_document(&document, &options.chunking);
        let batches = chunks.len().div_ceil(options.upsert_batch_size);
        println!("index {} (dry-run)", document.file_name);
        println!("  chunks: {}", chunks.len());
        println!("  upsert batches: {}", batches);
        return Ok(());
    }

    let services = Services::for_indexing(config).await?;
    let report = index_with(&services, &document, &options).await?;

    println!("index {}", report.file_name);
    println!("  index: {}", services.index.name());
    println!("  chunks: {}", report.chunks);
    println!("  vectors upserted: {}", report.vectors_upserted);
    println!("  upsert batches: {}", report.batches);
    println!("ok");
    Ok(())
}

/// Run the pipeline with already-constructed services.
pub async fn index_with(
    services: &Services,
    document: &Document,
    options: &IndexOptions,
) -> Result<IndexReport> {
    let report = index_document(
        document,
        options,
        services.embedder.as_ref(),
        services.index.as_ref(),
    )
    .await?;
    Ok(report)
}
