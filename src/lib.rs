//! # readme-rag
//!
//! Upload a README (or any UTF-8 text file), index it in a vector database,
//! and chat with it.
//!
//! The pure pieces (chunking, the indexing pipeline, retrieval and prompt
//! assembly) live in [`readme_rag_core`]. This crate supplies the concrete
//! collaborators (embedding providers, Pinecone, Gemini), configuration,
//! the `rag` CLI commands, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌────────────┐
//! │  upload  │──▶│ chunk + embed │──▶│  Pinecone  │
//! │ CLI/HTTP │   │   (pipeline)  │   │  / memory  │
//! └──────────┘   └───────────────┘   └─────┬──────┘
//!                                          │ top-k by file_name
//! ┌──────────┐   ┌───────────────┐         │
//! │ question │──▶│ embed + query │◀────────┘
//! └──────────┘   └───────┬───────┘
//!                        ▼
//!                ┌───────────────┐
//!                │    Gemini     │
//!                └───────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama, local, disabled) |
//! | [`pinecone`] | Pinecone REST client |
//! | [`index`] | Vector index selection |
//! | [`generation`] | Answer generation (Gemini, disabled) |
//! | [`services`] | Collaborators built once per process |
//! | [`ingest`] | `rag chunk` and `rag index` |
//! | [`ask`] | `rag ask` |
//! | [`server`] | Upload + chat HTTP server |
//! | [`http`] | Shared HTTP client and retry loop |

pub mod ask;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod index;
pub mod ingest;
pub mod pinecone;
pub mod server;
pub mod services;

pub use readme_rag_core;
