//! Generative model adapters.
//!
//! - **[`GeminiGenerator`]**: `POST {url}/v1beta/models/{model}:generateContent`.
//! - **[`DisabledGenerator`]**: returns errors; lets `rag index` run
//!   without a `GOOGLE_API_KEY`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use readme_rag_core::answer::Generator;

use crate::config::{require_env, GenerationConfig};
use crate::http;

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Generation provider is disabled. Set [generation] provider in config.")
    }
}

/// Google Gemini text generation.
pub struct GeminiGenerator {
    model: String,
    temperature: f32,
    base_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config.url.clone(),
            api_key,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = http::join_url(
            &self.base_url,
            &format!("/v1beta/models/{}:generateContent", self.model),
        );
        let body = request_body(prompt, self.temperature);

        let response = http::send_with_retry("Gemini", self.max_retries, false, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;

        let json: serde_json::Value = response.json().await?;
        let text = parse_response(&json)?;
        debug!(model = %self.model, chars = text.len(), "generated answer");
        Ok(text)
    }
}

fn request_body(prompt: &str, temperature: f32) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": { "temperature": temperature },
    })
}

/// Concatenate the text parts of the first candidate.
fn parse_response(json: &serde_json::Value) -> Result<String> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .with_context(|| match json.pointer("/promptFeedback/blockReason") {
            Some(reason) => format!("Gemini returned no candidates (blocked: {})", reason),
            None => "Invalid Gemini response: missing candidates".to_string(),
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .context("Invalid Gemini response: candidate has no content parts")?;

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}

/// Create the configured [`Generator`].
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    let generator: Arc<dyn Generator> = match config.provider.as_str() {
        "disabled" => Arc::new(DisabledGenerator),
        "gemini" => Arc::new(GeminiGenerator::new(config, require_env("GOOGLE_API_KEY")?)?),
        other => bail!("Unknown generation provider: {}", other),
    };
    info!(provider = %config.provider, model = generator.model_name(), "generation provider ready");
    Ok(generator)
}
