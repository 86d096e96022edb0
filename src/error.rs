// src/error.rs
// Standardized error types for the analysis pipeline

use thiserror::Error;

/// Main error type for the pagewatch pipeline
///
/// Every variant is terminal for the run it occurs in: the pipeline never
/// retries upstream failures and never propagates them to the ingestion
/// caller.
#[derive(Error, Debug)]
pub enum PagewatchError {
    #[error("analysis not configured: {0}")]
    Config(String),

    #[error("upstream API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("empty content in model response")]
    EmptyContent,

    #[error("failed to decode model output as JSON: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid analysis schema: {0}")]
    InvalidSchema(String),

    #[error("dispatch enqueue failed: {0}")]
    Enqueue(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Result using PagewatchError
pub type Result<T> = std::result::Result<T, PagewatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Error construction tests
    // ============================================================================

    #[test]
    fn test_config_error() {
        let err = PagewatchError::Config("API key not set".to_string());
        assert!(err.to_string().contains("analysis not configured"));
        assert!(err.to_string().contains("API key not set"));
    }

    #[test]
    fn test_upstream_error_carries_status_and_body() {
        let err = PagewatchError::Upstream {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn test_malformed_response_error() {
        let err = PagewatchError::MalformedResponse("choices missing".to_string());
        assert!(err.to_string().contains("malformed response"));
        assert!(err.to_string().contains("choices missing"));
    }

    #[test]
    fn test_empty_content_error() {
        let err = PagewatchError::EmptyContent;
        assert!(err.to_string().contains("empty content"));
    }

    #[test]
    fn test_parse_error_keeps_raw_text() {
        let source = serde_json::from_str::<i32>("not json").unwrap_err();
        let err = PagewatchError::Parse {
            raw: "not json".to_string(),
            source,
        };
        assert!(err.to_string().contains("decode model output"));
        match err {
            PagewatchError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            _ => panic!("expected Parse"),
        }
    }

    #[test]
    fn test_invalid_schema_error() {
        let err = PagewatchError::InvalidSchema("`score` missing or not numeric".to_string());
        assert!(err.to_string().contains("invalid analysis schema"));
        assert!(err.to_string().contains("score"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("{").unwrap_err();
        let err: PagewatchError = json_err.into();
        assert!(matches!(err, PagewatchError::Json(_)));
    }

    #[test]
    fn test_debug_impl() {
        let err = PagewatchError::EmptyContent;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("EmptyContent"));
    }

    // ============================================================================
    // Result type alias tests
    // ============================================================================

    #[test]
    fn test_result_ok() {
        let result: Result<i32> = Ok(42);
        assert!(result.is_ok());
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(PagewatchError::EmptyContent);
        assert!(result.is_err());
    }
}
