//! # readme-rag core
//!
//! Runtime-agnostic logic for readme-rag: data models, the overlapping
//! text chunker, the embedding and vector index traits, the indexing
//! pipeline, and retrieval-augmented answer assembly.
//!
//! This crate contains no tokio, HTTP clients, or filesystem I/O. Concrete
//! collaborators (embedding models, hosted vector indexes, generative
//! models) are implemented by the `readme-rag` application crate and passed
//! in explicitly.

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod pipeline;

pub use error::{AnswerError, ConfigError, IndexingError};
