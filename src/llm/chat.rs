// src/llm/chat.rs
// Message-style dialect (OpenAI-compatible chat completions):
// request building and response text extraction

use serde::{Deserialize, Serialize};

use super::RequestPurpose;
use crate::config::AiSettings;
use crate::error::{PagewatchError, Result};

/// Sampling temperature for both analysis and connectivity requests
const TEMPERATURE: f32 = 0.3;

// ============================================================================
// Request types
// ============================================================================

/// Chat completion request (OpenAI-compatible format)
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Build the message-style request body
pub fn build_body(
    settings: &AiSettings,
    purpose: RequestPurpose,
    system: &str,
    user: &str,
) -> Result<String> {
    let request = ChatRequest {
        model: settings.model.clone(),
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        temperature: TEMPERATURE,
        max_completion_tokens: purpose.max_completion_tokens(),
        response_format: ResponseFormat::json_object(),
    };
    Ok(serde_json::to_string(&request)?)
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Option<Vec<ResponseChoice>>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the model's text output from a successful message-style response.
///
/// Requires a non-empty `choices` list whose first element carries a message
/// with content; a missing shape is malformed, present-but-empty content is
/// an empty-content failure.
pub fn extract_text(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| PagewatchError::MalformedResponse(format!("not a chat response: {}", e)))?;

    let choices = response
        .choices
        .ok_or_else(|| PagewatchError::MalformedResponse("`choices` missing".into()))?;

    let first = choices
        .into_iter()
        .next()
        .ok_or_else(|| PagewatchError::MalformedResponse("`choices` is empty".into()))?;

    let message = first
        .message
        .ok_or_else(|| PagewatchError::MalformedResponse("`choices[0].message` missing".into()))?;

    let content = message
        .content
        .ok_or_else(|| PagewatchError::MalformedResponse("`choices[0].message.content` missing".into()))?;

    if content.trim().is_empty() {
        return Err(PagewatchError::EmptyContent);
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Request building
    // ============================================================================

    #[test]
    fn test_build_body_analysis() {
        let settings = AiSettings {
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let body = build_body(&settings, RequestPurpose::Analysis, "sys", "usr").unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "sys");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "usr");
        assert_eq!(value["temperature"], 0.3);
        assert_eq!(value["max_completion_tokens"], 500);
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_build_body_connectivity_token_budget() {
        let settings = AiSettings::default();
        let body = build_body(&settings, RequestPurpose::ConnectivityTest, "sys", "usr").unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["max_completion_tokens"], 100);
    }

    // ============================================================================
    // Response extraction
    // ============================================================================

    #[test]
    fn test_extract_text_basic() {
        let body = r#"{"choices":[{"message":{"content":"{\"score\":80}"}}]}"#;
        assert_eq!(extract_text(body).unwrap(), r#"{"score":80}"#);
    }

    #[test]
    fn test_extract_text_missing_choices_is_malformed() {
        let body = r#"{"id":"cmpl-1","object":"chat.completion"}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, PagewatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_text_empty_choices_is_malformed() {
        let body = r#"{"choices":[]}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, PagewatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_text_missing_message_is_malformed() {
        let body = r#"{"choices":[{"index":0}]}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, PagewatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_text_null_content_is_malformed() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, PagewatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_text_empty_content_is_empty_content() {
        let body = r#"{"choices":[{"message":{"content":"  "}}]}"#;
        let err = extract_text(body).unwrap_err();
        assert!(matches!(err, PagewatchError::EmptyContent));
    }

    #[test]
    fn test_extract_text_non_json_body_is_malformed() {
        let err = extract_text("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PagewatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_text_never_panics_on_odd_shapes() {
        for body in [
            r#"{"choices": 42}"#,
            r#"{"choices": null}"#,
            r#"[]"#,
            r#""just a string""#,
        ] {
            assert!(extract_text(body).is_err());
        }
    }
}
