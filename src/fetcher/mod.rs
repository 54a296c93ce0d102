use async_trait::async_trait;
use serde_json::Value;

pub mod client;
pub mod presets;

pub use client::ApiClient;

/// Anything that can turn a URL into a JSON document. The production
/// implementation is [`ApiClient`]; tests substitute stub sources.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Fetch failure taxonomy. Everything here is surfaced as a per-widget or
/// per-action message; nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx response.
    #[error("API returned {status}")]
    Status { status: reqwest::StatusCode },

    /// Transport or JSON decode failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Pre-flight quota check failed before the request was sent.
    #[error("API rate limit reached. Resets in {}", reset_in.as_deref().unwrap_or("soon"))]
    RateLimited { reset_in: Option<String> },
}
