//! Retrieval-augmented answer assembly.
//!
//! Embeds a question, fetches the closest chunks of one document from the
//! vector index, and asks a [`Generator`] to answer from that context.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::embedding::Embedder;
use crate::error::AnswerError;
use crate::index::VectorIndex;
use crate::models::{MetadataFilter, QueryMatch, QueryRequest};

pub const DEFAULT_TOP_K: usize = 3;

/// Text generation backend (a hosted LLM in production).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.0-flash"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A question scoped to one indexed document.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub file_name: String,
    pub top_k: usize,
}

impl AskRequest {
    pub fn new(question: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            file_name: file_name.into(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Markdown answer from the generator.
    pub response: String,
    /// Chunks the answer was grounded on, best first.
    pub sources: Vec<QueryMatch>,
}

/// Join matched chunk texts with blank lines.
pub fn build_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(|m| m.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Context:\n{context}\n\nQuestion: {question}\n\
         Provide a concise and helpful answer in well-formatted Markdown.\n"
    )
}

/// Answer a question against one document's chunks.
///
/// An empty match set is not an error: the generator is still called, with
/// an empty context.
pub async fn answer_question(
    request: &AskRequest,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    generator: &dyn Generator,
) -> Result<Answer, AnswerError> {
    if request.question.trim().is_empty() {
        return Err(AnswerError::EmptyQuestion);
    }
    if request.file_name.trim().is_empty() {
        return Err(AnswerError::EmptyFileName);
    }
    if request.top_k == 0 {
        return Err(AnswerError::ZeroTopK);
    }

    let vector = embedder
        .embed_query(&request.question)
        .await
        .map_err(AnswerError::Embedding)?;

    let matches = index
        .query(&QueryRequest {
            vector,
            top_k: request.top_k,
            filter: Some(MetadataFilter::file_name(&request.file_name)),
        })
        .await
        .map_err(AnswerError::Query)?;

    if matches.is_empty() {
        warn!(
            file_name = %request.file_name,
            index = index.name(),
            "no indexed chunks matched; answering without context"
        );
    } else {
        debug!(file_name = %request.file_name, matches = matches.len(), "retrieved context");
    }

    let prompt = build_prompt(&build_context(&matches), &request.question);
    let response = generator
        .generate(&prompt)
        .await
        .map_err(AnswerError::Generation)?;

    Ok(Answer {
        response,
        sources: matches,
    })
}
