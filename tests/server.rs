//! End-to-end tests for the HTTP server, with in-process collaborators.

use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;

use readme_rag::config::Config;
use readme_rag::server::router;
use readme_rag::services::Services;
use readme_rag_core::answer::Generator;
use readme_rag_core::embedding::Embedder;
use readme_rag_core::index::memory::InMemoryIndex;
use readme_rag_core::index::VectorIndex;
use readme_rag_core::models::{QueryMatch, QueryRequest, VectorRecord};

/// Bag-of-letters embedding: similar words land near each other, which is
/// all retrieval needs here.
struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    fn model_name(&self) -> &str {
        "letters"
    }
    fn dims(&self) -> usize {
        26
    }
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 26];
                for c in t.chars().filter(|c| c.is_ascii_alphabetic()) {
                    v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Answers with the prompt it was given, so tests can inspect the context.
struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo"
    }
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_name(&self) -> &str {
        "failing"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("quota exceeded")
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }
    fn dims(&self) -> usize {
        26
    }
    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding service unavailable")
    }
}

struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    fn name(&self) -> &str {
        "broken"
    }
    async fn upsert(&self, _records: &[VectorRecord]) -> Result<()> {
        anyhow::bail!("index rejected upsert")
    }
    async fn query(&self, _request: &QueryRequest) -> Result<Vec<QueryMatch>> {
        anyhow::bail!("index rejected query")
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.chunking.chunk_size = 120;
    config.chunking.overlap = 20;
    config.index.provider = "memory".to_string();
    config.index.dims = 26;
    config
}

async fn spawn_server(generator: Arc<dyn Generator>) -> (SocketAddr, Arc<InMemoryIndex>) {
    let index = Arc::new(InMemoryIndex::new("test"));
    let services = Services::new(Arc::new(LetterEmbedder), index.clone(), generator);
    (spawn_with(test_config(), services).await, index)
}

async fn spawn_with(config: Config, services: Services) -> SocketAddr {
    let app = router(Arc::new(config), services);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn error_of(response: reqwest::Response) -> (u16, String, String) {
    let status = response.status().as_u16();
    let body: serde_json::Value = response.json().await.unwrap();
    (
        status,
        body["error"]["code"].as_str().unwrap().to_string(),
        body["error"]["message"].as_str().unwrap().to_string(),
    )
}

async fn upload(addr: SocketAddr, file_name: &str, text: &str) -> reqwest::Response {
    let part = reqwest::multipart::Part::text(text.to_string()).file_name(file_name.to_string());
    let form = reqwest::multipart::Form::new().part("file", part);
    reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

async fn ask(addr: SocketAddr, query: &str, file_name: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{}/ask", addr))
        .form(&[("query", query), ("file_name", file_name)])
        .send()
        .await
        .unwrap()
}

const README: &str = "# Widget\n\nWidget is a tool for building widgets.\n\n\
## Install\n\nRun cargo install widget to install it.\n\n\
## Usage\n\nCall widget build in your project directory.\n";

#[tokio::test]
async fn test_health_and_page() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let health: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let page = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert!(page.status().is_success());
    let html = page.text().await.unwrap();
    assert!(html.contains("README Chatbot"));
    assert!(html.contains("/upload"));
}

#[tokio::test]
async fn test_upload_indexes_every_chunk() {
    let (addr, index) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = upload(addr, "README.md", README).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Successfully processed README.md");

    let records = index.records();
    assert_eq!(body["chunks"].as_u64().unwrap() as usize, records.len());
    assert!(records.len() > 1);
    for (i, record) in records.iter().enumerate() {
        assert!(record.id.starts_with("README.md-"));
        assert_eq!(record.metadata.file_name, "README.md");
        assert_eq!(record.metadata.chunk_id, i);
        assert_eq!(record.values.len(), 26);
    }
}

#[tokio::test]
async fn test_ask_uses_only_the_named_file() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    assert_eq!(upload(addr, "README.md", README).await.status(), 200);
    assert_eq!(
        upload(addr, "OTHER.md", "Gadget notes about zebras and quartz.")
            .await
            .status(),
        200
    );

    let response = ask(addr, "How do I install widget?", "README.md").await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let prompt = body["response"].as_str().unwrap();

    assert!(prompt.starts_with("Context:\n"));
    assert!(prompt.contains("Question: How do I install widget?"));
    assert!(prompt.contains("cargo install widget"));
    assert!(!prompt.contains("zebras"));
}

#[tokio::test]
async fn test_ask_unknown_file_still_answers() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = ask(addr, "Anything?", "never-uploaded.md").await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("Context:\n\n\nQuestion: Anything?"));
}

#[tokio::test]
async fn test_ask_rejects_empty_query() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = ask(addr, "   ", "README.md").await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_ask_missing_field_is_json_bad_request() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ask", addr))
        .form(&[("query", "hello")])
        .send()
        .await
        .unwrap();
    let (status, code, message) = error_of(response).await;
    assert_eq!(status, 400);
    assert_eq!(code, "bad_request");
    assert!(message.contains("file_name"));
}

#[tokio::test]
async fn test_ask_accepts_multipart_form() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;
    assert_eq!(upload(addr, "README.md", README).await.status(), 200);

    let form = reqwest::multipart::Form::new()
        .text("query", "How do I install widget?")
        .text("file_name", "README.md");
    let response = reqwest::Client::new()
        .post(format!("http://{}/ask", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let prompt = body["response"].as_str().unwrap();
    assert!(prompt.contains("Question: How do I install widget?"));
    assert!(prompt.contains("cargo install widget"));
}

#[tokio::test]
async fn test_ask_multipart_missing_field() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let form = reqwest::multipart::Form::new().text("query", "hello");
    let response = reqwest::Client::new()
        .post(format!("http://{}/ask", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let (status, code, message) = error_of(response).await;
    assert_eq!(status, 400);
    assert_eq!(code, "bad_request");
    assert_eq!(message, "missing form field: file_name");
}

#[tokio::test]
async fn test_ask_unsupported_body_is_json_bad_request() {
    let (addr, _) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ask", addr))
        .header("content-type", "application/json")
        .body(r#"{"query":"hi","file_name":"README.md"}"#)
        .send()
        .await
        .unwrap();
    let (status, code, _) = error_of(response).await;
    assert_eq!(status, 400);
    assert_eq!(code, "bad_request");
}

#[tokio::test]
async fn test_upload_non_multipart_is_json_bad_request() {
    let (addr, index) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .body("just some text")
        .send()
        .await
        .unwrap();
    let (status, code, _) = error_of(response).await;
    assert_eq!(status, 400);
    assert_eq!(code, "bad_request");
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_upload_over_limit_is_payload_too_large() {
    let mut config = test_config();
    config.server.max_upload_bytes = 1024;
    let index = Arc::new(InMemoryIndex::new("test"));
    let services = Services::new(
        Arc::new(LetterEmbedder),
        index.clone(),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(config, services).await;

    let (status, code, _) = error_of(upload(addr, "BIG.md", &"A".repeat(5000)).await).await;
    assert_eq!(status, 413);
    assert_eq!(code, "payload_too_large");
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_embedder_failure_on_upload_is_indexing_failed() {
    let services = Services::new(
        Arc::new(FailingEmbedder),
        Arc::new(InMemoryIndex::new("test")),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(test_config(), services).await;

    let (status, code, message) = error_of(upload(addr, "README.md", README).await).await;
    assert_eq!(status, 502);
    assert_eq!(code, "indexing_failed");
    assert!(message.contains("embedding service unavailable"));
}

#[tokio::test]
async fn test_index_failure_on_upload_is_indexing_failed() {
    let services = Services::new(
        Arc::new(LetterEmbedder),
        Arc::new(FailingIndex),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(test_config(), services).await;

    let (status, code, message) = error_of(upload(addr, "README.md", README).await).await;
    assert_eq!(status, 502);
    assert_eq!(code, "indexing_failed");
    assert!(message.contains("index rejected upsert"));
}

#[tokio::test]
async fn test_embedder_failure_on_ask_is_retrieval_failed() {
    let services = Services::new(
        Arc::new(FailingEmbedder),
        Arc::new(InMemoryIndex::new("test")),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(test_config(), services).await;

    let (status, code, message) = error_of(ask(addr, "How?", "README.md").await).await;
    assert_eq!(status, 502);
    assert_eq!(code, "retrieval_failed");
    assert!(message.contains("failed to embed question"));
}

#[tokio::test]
async fn test_index_failure_on_ask_is_retrieval_failed() {
    let services = Services::new(
        Arc::new(LetterEmbedder),
        Arc::new(FailingIndex),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(test_config(), services).await;

    let (status, code, message) = error_of(ask(addr, "How?", "README.md").await).await;
    assert_eq!(status, 502);
    assert_eq!(code, "retrieval_failed");
    assert!(message.contains("index rejected query"));
}

#[tokio::test]
async fn test_invalid_chunking_on_upload_is_config_error() {
    let mut config = test_config();
    config.chunking.chunk_size = 50;
    config.chunking.overlap = 50;
    let index = Arc::new(InMemoryIndex::new("test"));
    let services = Services::new(
        Arc::new(LetterEmbedder),
        index.clone(),
        Arc::new(EchoGenerator),
    );
    let addr = spawn_with(config, services).await;

    let (status, code, message) = error_of(upload(addr, "README.md", README).await).await;
    assert_eq!(status, 400);
    assert_eq!(code, "config_error");
    assert!(message.contains("overlap (50) must be smaller than chunk_size (50)"));
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_bad_gateway() {
    let (addr, _) = spawn_server(Arc::new(FailingGenerator)).await;
    assert_eq!(upload(addr, "README.md", README).await.status(), 200);

    let response = ask(addr, "How do I install widget?", "README.md").await;
    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "generation_failed");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("quota exceeded"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let (addr, index) = spawn_server(Arc::new(EchoGenerator)).await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_upload_rejects_binary() {
    let (addr, index) = spawn_server(Arc::new(EchoGenerator)).await;

    let part = reqwest::multipart::Part::bytes(vec![0xff, 0xfe, 0x00, 0x01]).file_name("logo.png");
    let form = reqwest::multipart::Form::new().part("file", part);
    let response = reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("logo.png is not UTF-8 text"));
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_upload_empty_file_has_no_chunks() {
    let (addr, index) = spawn_server(Arc::new(EchoGenerator)).await;

    let response = upload(addr, "EMPTY.md", "").await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Successfully processed EMPTY.md");
    assert_eq!(body["chunks"], 0);
    assert!(index.is_empty());
}
