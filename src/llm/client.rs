// src/llm/client.rs
// One request/response exchange with the upstream provider

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::transport::{HttpTransport, ReqwestTransport};
use super::{Dialect, RequestPurpose};
use crate::config::AiSettings;
use crate::error::{PagewatchError, Result};

/// How much of an offending response body to log
const LOG_BODY_LIMIT: usize = 2_000;

/// Client for one-shot exchanges with the configured provider.
///
/// Selects the dialect from the model identifier, builds the request, runs
/// the HTTP call, extracts the text output, and decodes it as JSON. The
/// decoded payload is untyped; schema validation belongs to the evaluator.
pub struct AiClient {
    transport: Arc<dyn HttpTransport>,
}

impl AiClient {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Run one exchange and return the decoded model payload.
    pub async fn exchange(
        &self,
        settings: &AiSettings,
        purpose: RequestPurpose,
        system: &str,
        user: &str,
    ) -> Result<Value> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PagewatchError::Config("API key not set".into()))?;

        let dialect = Dialect::for_model(&settings.model);
        let request = dialect.build_request(settings, purpose, system, user)?;

        let request_id = Uuid::new_v4();
        let start = Instant::now();
        debug!(
            %request_id,
            model = %settings.model,
            %dialect,
            purpose = ?purpose,
            url = %request.url,
            "sending upstream request"
        );

        let response = self
            .transport
            .post_json(&request.url, api_key, request.body)
            .await?;

        if !response.is_success() {
            warn!(
                %request_id,
                status = response.status,
                body = %truncate_for_log(&response.body),
                "upstream returned non-success status"
            );
            return Err(PagewatchError::Upstream {
                status: response.status,
                body: response.body,
            });
        }

        let text = dialect.extract_text(&response.body).inspect_err(|e| {
            warn!(
                %request_id,
                error = %e,
                body = %truncate_for_log(&response.body),
                "failed to extract text from upstream response"
            );
        })?;

        let payload: Value = serde_json::from_str(&text).map_err(|source| {
            warn!(%request_id, raw = %truncate_for_log(&text), "model output is not valid JSON");
            PagewatchError::Parse {
                raw: text.clone(),
                source,
            }
        })?;

        info!(
            %request_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "model response decoded"
        );

        Ok(payload)
    }
}

impl Default for AiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_for_log(s: &str) -> &str {
    let mut end = s.len().min(LOG_BODY_LIMIT);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
