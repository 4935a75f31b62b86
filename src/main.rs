//! # readme-rag CLI (`rag`)
//!
//! Chunk a README, index it in a vector database, and ask questions about it
//! from the terminal or through the bundled web page.
//!
//! ## Usage
//!
//! ```bash
//! rag --config ./config/rag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rag chunk <file>` | Print the chunk spans for a file (no network) |
//! | `rag index <file>` | Chunk, embed, and upsert a file |
//! | `rag ask "<question>" --file-name <name>` | Answer a question from one file's chunks |
//! | `rag serve` | Start the upload + chat HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect how a README will be split
//! rag chunk README.md
//!
//! # Index it (uses PINECONE_API_KEY and the configured embedder)
//! rag index README.md
//!
//! # Ask about it (uses GOOGLE_API_KEY)
//! rag ask "How do I install this?" --file-name README.md
//!
//! # Serve the web page on [server].bind
//! rag serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use readme_rag::{ask, config, ingest, server};

/// readme-rag: upload a README, index it, and chat with it.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rag",
    about = "Upload a README, index it in a vector database, and chat with it",
    version,
    long_about = "readme-rag splits a text document into overlapping chunks, embeds them, \
    stores the vectors in Pinecone (or an in-memory index), and answers questions about the \
    document with Gemini using the most similar chunks as context."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rag.toml`. Chunking, embedding, index,
    /// generation, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/rag.toml")]
    config: PathBuf,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the chunk spans for a file.
    ///
    /// Runs only the chunker with the configured `chunk_size` and `overlap`.
    /// No embedding model or index is contacted.
    Chunk {
        /// Path to a UTF-8 text file.
        path: PathBuf,
    },

    /// Chunk, embed, and upsert a file into the vector index.
    ///
    /// Each chunk becomes one vector with metadata `text`, `file_name`,
    /// and `chunk_id`. Re-indexing the same file adds new vectors.
    Index {
        /// Path to a UTF-8 text file.
        path: PathBuf,

        /// Name stored in metadata and used by `ask --file-name`.
        /// Defaults to the path's file name.
        #[arg(long)]
        file_name: Option<String>,

        /// Dry run: show chunk and batch counts without embedding or upserting.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a question using one indexed file as context.
    Ask {
        /// The question.
        question: String,

        /// Restrict retrieval to chunks from this file.
        #[arg(long)]
        file_name: String,

        /// Number of chunks to retrieve (defaults to `[index].top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Also print the retrieved chunks with their scores.
        #[arg(long)]
        sources: bool,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves the upload + chat page along
    /// with the `/upload` and `/ask` endpoints.
    Serve,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunk { path } => {
            ingest::run_chunk(&cfg, &path)?;
        }
        Commands::Index {
            path,
            file_name,
            dry_run,
        } => {
            ingest::run_index(&cfg, &path, file_name.as_deref(), dry_run).await?;
        }
        Commands::Ask {
            question,
            file_name,
            top_k,
            sources,
        } => {
            ask::run_ask(&cfg, &question, &file_name, top_k, sources).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
