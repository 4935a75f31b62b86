//! Pinecone vector index adapter.
//!
//! Talks to the Pinecone REST API directly:
//!
//! | Plane | Method | Path | Used for |
//! |-------|--------|------|----------|
//! | control | `GET` | `/indexes/{name}` | resolve data-plane host, check dimension |
//! | data | `POST` | `/vectors/upsert` | [`VectorIndex::upsert`] |
//! | data | `POST` | `/query` | [`VectorIndex::query`] |
//!
//! Metadata is stored as `{text, file_name, chunk_id}`. Filters are sent as
//! `{"file_name": {"$eq": "<name>"}}`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use readme_rag_core::index::VectorIndex;
use readme_rag_core::models::{ChunkMetadata, MetadataFilter, QueryMatch, QueryRequest, VectorRecord};

use crate::config::IndexConfig;
use crate::http;

const API_VERSION: &str = "2025-01";

/// Handle to one Pinecone index. Construct once with [`PineconeIndex::connect`].
pub struct PineconeIndex {
    name: String,
    host: String,
    namespace: Option<String>,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// Resolve the index host and verify it exists with the configured dimension.
    ///
    /// When `index.host` is set the control-plane lookup is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the index does not exist, its dimension differs from
    /// `index.dims`, or the control plane cannot be reached.
    pub async fn connect(config: &IndexConfig, api_key: String) -> Result<Self> {
        let client = http::client(config.timeout_secs)?;

        let host = match &config.host {
            Some(host) => normalize_host(host),
            None => {
                let url = http::join_url(&config.control_url, &format!("/indexes/{}", config.name));
                let response = http::send_with_retry("Pinecone", config.max_retries, true, || {
                    client
                        .get(&url)
                        .header("Api-Key", &api_key)
                        .header("X-Pinecone-API-Version", API_VERSION)
                })
                .await?;

                if response.status() == StatusCode::NOT_FOUND {
                    bail!("Index '{}' not found", config.name);
                }

                let json: serde_json::Value = response.json().await?;
                let description = parse_index_description(&json)?;
                if description.dimension != config.dims {
                    bail!(
                        "Index '{}' has dimension {}, but index.dims is {}",
                        config.name,
                        description.dimension,
                        config.dims
                    );
                }
                normalize_host(&description.host)
            }
        };

        info!(index = %config.name, host = %host, "connected to Pinecone index");

        Ok(Self {
            name: config.name.clone(),
            host,
            namespace: config.namespace.clone(),
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let url = http::join_url(&self.host, path);
        let response = http::send_with_retry("Pinecone", self.max_retries, false, || {
            self.client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(body)
        })
        .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let body = upsert_body(records, self.namespace.as_deref());
        let json = self.post("/vectors/upsert", &body).await?;
        debug!(
            index = %self.name,
            sent = records.len(),
            upserted = json.get("upsertedCount").and_then(|c| c.as_u64()).unwrap_or(0),
            "pinecone upsert"
        );
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<QueryMatch>> {
        let body = query_body(request, self.namespace.as_deref());
        let json = self.post("/query", &body).await?;
        parse_query_response(&json)
    }
}

struct IndexDescription {
    dimension: usize,
    host: String,
}

fn parse_index_description(json: &serde_json::Value) -> Result<IndexDescription> {
    let host = json
        .get("host")
        .and_then(|h| h.as_str())
        .context("Invalid Pinecone index description: missing host")?;
    let dimension = json
        .get("dimension")
        .and_then(|d| d.as_u64())
        .context("Invalid Pinecone index description: missing dimension")?;
    Ok(IndexDescription {
        dimension: dimension as usize,
        host: host.to_string(),
    })
}

/// Pinecone reports bare hostnames; add a scheme when missing.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

fn upsert_body(records: &[VectorRecord], namespace: Option<&str>) -> serde_json::Value {
    let vectors: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "values": r.values,
                "metadata": r.metadata,
            })
        })
        .collect();

    let mut body = serde_json::json!({ "vectors": vectors });
    if let Some(ns) = namespace {
        body["namespace"] = serde_json::json!(ns);
    }
    body
}

fn filter_json(filter: &MetadataFilter) -> Option<serde_json::Value> {
    filter
        .file_name
        .as_ref()
        .map(|name| serde_json::json!({ "file_name": { "$eq": name } }))
}

fn query_body(request: &QueryRequest, namespace: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "vector": request.vector,
        "topK": request.top_k,
        "includeMetadata": true,
        "includeValues": false,
    });
    if let Some(filter) = request.filter.as_ref().and_then(filter_json) {
        body["filter"] = filter;
    }
    if let Some(ns) = namespace {
        body["namespace"] = serde_json::json!(ns);
    }
    body
}

fn parse_query_response(json: &serde_json::Value) -> Result<Vec<QueryMatch>> {
    let matches = json
        .get("matches")
        .and_then(|m| m.as_array())
        .context("Invalid Pinecone response: missing matches array")?;

    matches
        .iter()
        .map(|m| {
            let id = m
                .get("id")
                .and_then(|v| v.as_str())
                .context("Invalid Pinecone response: match without id")?;
            let score = m.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
            let metadata = m.get("metadata").cloned().unwrap_or_default();
            Ok(QueryMatch {
                id: id.to_string(),
                score,
                metadata: parse_metadata(&metadata)
                    .with_context(|| format!("Invalid Pinecone response: match '{}'", id))?,
            })
        })
        .collect()
}

/// Pinecone returns numeric metadata as floats (`3.0`), so `chunk_id` is
/// read as a number rather than deserialized strictly.
fn parse_metadata(metadata: &serde_json::Value) -> Result<ChunkMetadata> {
    let text = metadata
        .get("text")
        .and_then(|v| v.as_str())
        .context("metadata missing text")?;
    let file_name = metadata
        .get("file_name")
        .and_then(|v| v.as_str())
        .context("metadata missing file_name")?;
    let chunk_id = metadata
        .get("chunk_id")
        .and_then(|v| v.as_f64())
        .context("metadata missing chunk_id")?;
    Ok(ChunkMetadata {
        text: text.to_string(),
        file_name: file_name.to_string(),
        chunk_id: chunk_id as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VectorRecord {
        VectorRecord {
            id: "README.md-1".to_string(),
            values: vec![0.5, 0.25],
            metadata: ChunkMetadata {
                text: "Install with cargo.".to_string(),
                file_name: "README.md".to_string(),
                chunk_id: 4,
            },
        }
    }

    #[test]
    fn test_upsert_body_shape() {
        let body = upsert_body(&[record()], None);
        let v = &body["vectors"][0];
        assert_eq!(v["id"], "README.md-1");
        assert_eq!(v["values"], serde_json::json!([0.5, 0.25]));
        assert_eq!(v["metadata"]["file_name"], "README.md");
        assert_eq!(v["metadata"]["chunk_id"], 4);
        assert!(body.get("namespace").is_none());
    }

    #[test]
    fn test_query_body_with_filter_and_namespace() {
        let request = QueryRequest {
            vector: vec![1.0],
            top_k: 3,
            filter: Some(MetadataFilter::file_name("README.md")),
        };
        let body = query_body(&request, Some("docs"));
        assert_eq!(body["topK"], 3);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["filter"]["file_name"]["$eq"], "README.md");
        assert_eq!(body["namespace"], "docs");
    }

    #[test]
    fn test_query_body_without_filter() {
        let request = QueryRequest {
            vector: vec![1.0],
            top_k: 1,
            filter: Some(MetadataFilter::default()),
        };
        assert!(query_body(&request, None).get("filter").is_none());
    }

    #[test]
    fn test_parse_query_response_float_chunk_id() {
        let json = serde_json::json!({
            "matches": [{
                "id": "README.md-1",
                "score": 0.91,
                "metadata": { "text": "hello", "file_name": "README.md", "chunk_id": 3.0 }
            }]
        });
        let matches = parse_query_response(&json).unwrap();
        assert_eq!(matches[0].metadata.chunk_id, 3);
        assert!((matches[0].score - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_parse_query_response_rejects_incomplete_metadata() {
        let json = serde_json::json!({
            "matches": [{
                "id": "README.md-1",
                "score": 0.5,
                "metadata": { "file_name": "README.md", "chunk_id": 0.0 }
            }]
        });
        let err = parse_query_response(&json).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("match 'README.md-1'"));
        assert!(msg.contains("metadata missing text"));

        let json = serde_json::json!({ "matches": [{ "id": "x", "score": 0.5 }] });
        assert!(parse_query_response(&json).is_err());
    }

    #[test]
    fn test_parse_query_response_missing_matches() {
        assert!(parse_query_response(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("index1-abc.svc.pinecone.io"),
            "https://index1-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }
}
