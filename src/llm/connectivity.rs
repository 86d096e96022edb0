// src/llm/connectivity.rs
// Credentials and dialect plumbing check
//
// Runs the same request/response contract as the analysis flow with a
// minimal budget, but only requires a free-form `message` field in the
// decoded payload. No score or threshold computation.

use serde_json::Value;
use tracing::info;

use super::prompt::{CONNECTIVITY_SYSTEM_PROMPT, CONNECTIVITY_USER_CONTENT};
use super::{AiClient, RequestPurpose};
use crate::config::AiSettings;
use crate::error::{PagewatchError, Result};

/// Verify the configured credentials and dialect plumbing with a minimal
/// request. Returns the model's confirmation message.
pub async fn check_connectivity(client: &AiClient, settings: &AiSettings) -> Result<String> {
    let payload = client
        .exchange(
            settings,
            RequestPurpose::ConnectivityTest,
            CONNECTIVITY_SYSTEM_PROMPT,
            CONNECTIVITY_USER_CONTENT,
        )
        .await?;

    match payload.get("message").and_then(Value::as_str) {
        Some(message) if !message.trim().is_empty() => {
            info!(model = %settings.model, "connectivity check succeeded");
            Ok(message.to_string())
        }
        _ => Err(PagewatchError::InvalidSchema(
            "`message` missing or empty in connectivity response".into(),
        )),
    }
}
