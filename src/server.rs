//! HTTP server: upload a README, then chat with it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Upload + chat page |
//! | `POST` | `/upload` | Multipart field `file`; chunk, embed, and upsert it |
//! | `POST` | `/ask` | Form fields `query`, `file_name` (urlencoded or multipart); answer from that file's chunks |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `config_error` (400),
//! `payload_too_large` (413), `indexing_failed` (502),
//! `retrieval_failed` (502), `generation_failed` (502).
//!
//! Requests rejected by the form and multipart extractors are reported as
//! `bad_request` with the same JSON body.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the page can be
//! served from anywhere.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::FormRejection,
        DefaultBodyLimit, FromRequest, Multipart, Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use readme_rag_core::answer::{answer_question, AskRequest};
use readme_rag_core::models::Document;
use readme_rag_core::pipeline::index_document;
use readme_rag_core::{AnswerError, IndexingError};

use crate::config::Config;
use crate::services::Services;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    services: Services,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Collaborators are constructed once here and shared by every request.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let services = Services::from_config(config).await?;
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()), services);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    println!("readme-rag server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with explicit collaborators.
pub fn router(config: Arc<Config>, services: Services) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = config.server.max_upload_bytes;
    let state = AppState { config, services };

    Router::new()
        .route("/", get(handle_ui))
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"indexing_failed"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, "{}", self.message);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

/// Body-limit violations surface while streaming fields, not at extraction.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "request body exceeds server.max_upload_bytes",
            )
        } else {
            bad_request(format!("invalid multipart body: {}", err.body_text()))
        }
    }
}

impl From<IndexingError> for AppError {
    fn from(err: IndexingError) -> Self {
        match err {
            IndexingError::Config(_) => {
                AppError::new(StatusCode::BAD_REQUEST, "config_error", err.to_string())
            }
            _ => AppError::new(StatusCode::BAD_GATEWAY, "indexing_failed", err.to_string()),
        }
    }
}

impl From<AnswerError> for AppError {
    fn from(err: AnswerError) -> Self {
        if err.is_invalid_input() {
            return bad_request(err.to_string());
        }
        match err {
            AnswerError::Generation(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, "generation_failed", err.to_string())
            }
            _ => AppError::new(StatusCode::BAD_GATEWAY, "retrieval_failed", err.to_string()),
        }
    }
}

// ============ GET / ============

async fn handle_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    chunks: usize,
}

/// Handler for `POST /upload`.
///
/// Reads the `file` field, decodes it as UTF-8, and runs the indexing
/// pipeline. The upload's file name becomes the `file_name` that `/ask`
/// filters on.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| bad_request("file field must carry a file name"))?;
        let bytes = field.bytes().await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| bad_request(format!("{} is not UTF-8 text", file_name)))?;
        upload = Some(Document::new(file_name, text));
        break;
    }

    let document = upload.ok_or_else(|| bad_request("missing multipart field: file"))?;
    let options = state
        .config
        .index_options()
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, "config_error", format!("{:#}", e)))?;

    let report = index_document(
        &document,
        &options,
        state.services.embedder.as_ref(),
        state.services.index.as_ref(),
    )
    .await?;

    Ok(Json(UploadResponse {
        message: format!("Successfully processed {}", report.file_name),
        chunks: report.chunks,
    }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskForm {
    query: String,
    file_name: String,
}

#[derive(Serialize)]
struct AskResponse {
    response: String,
}

/// Read `query` and `file_name` from either body encoding the page or
/// `curl -F` may send.
async fn read_ask_form(request: Request, state: &AppState) -> Result<AskForm, AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(form) = Form::<AskForm>::from_request(request, state).await?;
        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, state).await?;
    let mut query = None;
    let mut file_name = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("query") => query = Some(field.text().await?),
            Some("file_name") => file_name = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(AskForm {
        query: query.ok_or_else(|| bad_request("missing form field: query"))?,
        file_name: file_name.ok_or_else(|| bad_request("missing form field: file_name"))?,
    })
}

/// Handler for `POST /ask`.
async fn handle_ask(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<AskResponse>, AppError> {
    let form = read_ask_form(request, &state).await?;
    let mut request = AskRequest::new(form.query, form.file_name);
    request.top_k = state.config.index.top_k;

    let answer = answer_question(
        &request,
        state.services.embedder.as_ref(),
        state.services.index.as_ref(),
        state.services.generator.as_ref(),
    )
    .await?;

    Ok(Json(AskResponse {
        response: answer.response,
    }))
}
