//! Shared HTTP plumbing for the hosted-service adapters.
//!
//! All adapters (embeddings, Pinecone, Gemini) use [`send_with_retry`],
//! which applies the same retry policy:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Build a client with the given request timeout.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Whether a response status is worth retrying.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Send a request, retrying transient failures.
///
/// `build` is called once per attempt because a `RequestBuilder` cannot be
/// reused. Returns the first successful response, or `Ok` with the 404
/// response when `allow_not_found` is set so callers can map it themselves.
pub async fn send_with_retry<F>(
    service: &str,
    max_retries: u32,
    allow_not_found: bool,
    mut build: F,
) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff(attempt)).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() || (allow_not_found && status == StatusCode::NOT_FOUND) {
                    return Ok(response);
                }

                let body_text = response.text().await.unwrap_or_default();
                if is_retryable(status) {
                    warn!(
                        service,
                        %status,
                        attempt = attempt + 1,
                        max_attempts = max_retries + 1,
                        "transient API error, retrying"
                    );
                    last_err = Some(anyhow::anyhow!(
                        "{} API error {}: {}",
                        service,
                        status,
                        body_text
                    ));
                    continue;
                }

                bail!("{} API error {}: {}", service, status, body_text);
            }
            Err(e) => {
                warn!(service, error = %e, attempt = attempt + 1, "request failed, retrying");
                last_err = Some(anyhow::anyhow!("{} connection error: {}", service, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", service)))
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(4), Duration::from_secs(8));
        assert_eq!(backoff(6), Duration::from_secs(32));
        assert_eq!(backoff(20), Duration::from_secs(32));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.pinecone.io/", "/indexes/index1"),
            "https://api.pinecone.io/indexes/index1"
        );
        assert_eq!(join_url("http://h", "query"), "http://h/query");
    }
}
