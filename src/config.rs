// src/config.rs
// Per-user AI analysis settings
//
// Defaults are explicit fields of the value passed into each pipeline run,
// not ambient constants read from deep call paths.

use serde::{Deserialize, Serialize};

use crate::llm::prompt::DEFAULT_SYSTEM_PROMPT;

/// Default API base URL (OpenAI-compatible)
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model when the user has not picked one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default meaningfulness threshold (score 0-100, inclusive boundary)
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// AI analysis settings for one user, read-only to the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom system prompt; falls back to the built-in default
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_threshold")]
    pub meaningful_change_threshold: f64,
    #[serde(default = "default_enabled")]
    pub analysis_enabled: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_enabled() -> bool {
    true
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            system_prompt: None,
            meaningful_change_threshold: default_threshold(),
            analysis_enabled: true,
        }
    }
}

impl AiSettings {
    /// Base URL with any trailing slash stripped, ready for endpoint concatenation
    pub fn endpoint_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Effective system prompt for the analysis flow
    pub fn system_prompt_or_default(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Whether the pipeline should run at all for this user
    pub fn analysis_available(&self) -> bool {
        self.analysis_enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
