// src/llm/responses.rs
// Reasoning-style dialect (Responses API): request building and response
// text extraction

use serde::{Deserialize, Serialize};

use super::RequestPurpose;
use crate::config::AiSettings;
use crate::error::{PagewatchError, Result};

// ============================================================================
// Request types
// ============================================================================

/// Responses API request
#[derive(Debug, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub reasoning: ReasoningConfig,
    /// System prompt
    pub instructions: String,
    /// User content
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct ReasoningConfig {
    pub effort: String,
}

/// Build the reasoning-style request body
pub fn build_body(
    settings: &AiSettings,
    purpose: RequestPurpose,
    system: &str,
    user: &str,
) -> Result<String> {
    let request = ResponsesRequest {
        model: settings.model.clone(),
        reasoning: ReasoningConfig {
            effort: purpose.reasoning_effort().to_string(),
        },
        instructions: system.to_string(),
        input: user.to_string(),
    };
    Ok(serde_json::to_string(&request)?)
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    /// Convenience field some responses carry at the top level
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

/// Output item; reasoning items carry no content and deserialize to an
/// empty list
#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    part_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Extract the model's text output from a successful reasoning-style
/// response.
///
/// Prefers the top-level `output_text` convenience field; otherwise scans
/// the ordered `output` items for the first content entry tagged as textual
/// output. Neither source yielding text is an empty-content failure.
pub fn extract_text(body: &str) -> Result<String> {
    let response: ResponsesResponse = serde_json::from_str(body).map_err(|e| {
        PagewatchError::MalformedResponse(format!("not a responses payload: {}", e))
    })?;

    if let Some(text) = response.output_text {
        if !text.trim().is_empty() {
            return Ok(text);
        }
    }

    for item in response.output {
        for part in item.content {
            if part.part_type == "output_text" {
                if let Some(text) = part.text {
                    if !text.trim().is_empty() {
                        return Ok(text);
                    }
                }
            }
        }
    }

    Err(PagewatchError::EmptyContent)
}
