use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use super::{FetchError, JsonSource};

/// Plain JSON GET client. No authentication of its own; preset URLs carry
/// their API keys in the query string.
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("FinBoard/1.0"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonSource for ApiClient {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);

        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status(),
            });
        }

        Ok(resp.json().await?)
    }
}
