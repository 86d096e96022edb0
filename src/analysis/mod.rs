// src/analysis/mod.rs
// Meaningfulness evaluation of a decoded model payload
//
// The parser hands over an untyped JSON value; this module is the single
// point that converts it into a typed AnalysisResult or rejects it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AiSettings;
use crate::error::{PagewatchError, Result};

/// Structured description of a detected content change, produced upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffPayload {
    /// Textual summary of the change
    pub text: String,
    /// Raw structured representation of the change
    pub json: Value,
}

/// Scrape metadata carried through to the outbound dispatch payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rendered_content: Option<String>,
    #[serde(default)]
    pub scraped_at: Option<DateTime<Utc>>,
}

/// Final meaningfulness judgment for one diff
///
/// Invariant: `is_meaningful == (score >= threshold)`, recomputed here and
/// never trusted from the model output. Created once per diff, persisted,
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "meaningfulChangeScore")]
    pub score: f64,
    #[serde(rename = "isMeaningfulChange")]
    pub is_meaningful: bool,
    pub reasoning: String,
    pub analyzed_at: DateTime<Utc>,
    /// Configured model identifier, not the string the provider echoes back
    pub model: String,
}

/// Validate the decoded payload and derive the meaningfulness decision.
///
/// Requires `score` to be numeric and `reasoning` to be a non-empty string.
/// A model-supplied meaningfulness boolean is ignored; the configured
/// threshold is the sole authority (inclusive boundary).
pub fn evaluate(payload: &Value, settings: &AiSettings) -> Result<AnalysisResult> {
    let score = payload
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| PagewatchError::InvalidSchema("`score` missing or not numeric".into()))?;

    let reasoning = payload
        .get("reasoning")
        .and_then(Value::as_str)
        .ok_or_else(|| PagewatchError::InvalidSchema("`reasoning` missing or not a string".into()))?;
    if reasoning.trim().is_empty() {
        return Err(PagewatchError::InvalidSchema("`reasoning` is empty".into()));
    }

    Ok(AnalysisResult {
        score,
        is_meaningful: score >= settings.meaningful_change_threshold,
        reasoning: reasoning.to_string(),
        analyzed_at: Utc::now(),
        model: settings.model.clone(),
    })
}
