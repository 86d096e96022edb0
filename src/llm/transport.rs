// src/llm/transport.rs
// HTTP transport seam for upstream AI providers
//
// The pipeline imposes no retry policy: any upstream failure is terminal
// for the run, so the transport makes exactly one attempt.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::Result;

/// Request timeout - allow time for reasoning models
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw upstream response: status code plus body text
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for POSTing a JSON request body with Bearer auth
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, api_key: &str, body: String) -> Result<RawResponse>;
}

/// reqwest-backed transport used in production
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Create from an existing reqwest::Client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: String) -> Result<RawResponse> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(RawResponse { status, body })
    }
}
