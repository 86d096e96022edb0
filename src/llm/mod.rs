// src/llm/mod.rs
// Upstream AI provider plumbing: dialect selection, request building,
// transport, and response decoding

pub mod chat;
mod client;
mod connectivity;
pub mod prompt;
pub mod responses;
mod transport;

use std::fmt;

use crate::config::AiSettings;
use crate::error::Result;

pub use client::AiClient;
pub use connectivity::check_connectivity;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

/// Exact case-sensitive substring in the model identifier that selects the
/// reasoning-style dialect
const REASONING_MODEL_MARKER: &str = "gpt-5";

/// One of two incompatible request/response shapes used by different model
/// families on the same provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Responses API: `{model, reasoning, instructions, input}`
    Responses,
    /// Chat completions: `{model, messages, temperature, ...}`
    ChatCompletions,
}

impl Dialect {
    /// Single source of truth for dialect choice, shared by the analysis
    /// flow and the connectivity check
    pub fn for_model(model: &str) -> Self {
        if model.contains(REASONING_MODEL_MARKER) {
            Self::Responses
        } else {
            Self::ChatCompletions
        }
    }

    /// Endpoint path under the provider base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Responses => "responses",
            Self::ChatCompletions => "chat/completions",
        }
    }

    /// Build the target URL and request body. Pure; no side effects.
    pub fn build_request(
        &self,
        settings: &AiSettings,
        purpose: RequestPurpose,
        system: &str,
        user: &str,
    ) -> Result<ProviderRequest> {
        let url = format!("{}/{}", settings.endpoint_base(), self.endpoint());
        let body = match self {
            Self::Responses => responses::build_body(settings, purpose, system, user)?,
            Self::ChatCompletions => chat::build_body(settings, purpose, system, user)?,
        };
        Ok(ProviderRequest { url, body })
    }

    /// Extract the model's text output from a successful response body
    pub fn extract_text(&self, body: &str) -> Result<String> {
        match self {
            Self::Responses => responses::extract_text(body),
            Self::ChatCompletions => chat::extract_text(body),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Responses => write!(f, "responses"),
            Self::ChatCompletions => write!(f, "chat_completions"),
        }
    }
}

/// Purpose tag for a request: controls only prompt content and budgets,
/// never structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    ConnectivityTest,
    Analysis,
}

impl RequestPurpose {
    /// Reasoning effort for the reasoning-style dialect
    pub fn reasoning_effort(&self) -> &'static str {
        match self {
            Self::ConnectivityTest => "low",
            Self::Analysis => "medium",
        }
    }

    /// Output token budget for the message-style dialect
    pub fn max_completion_tokens(&self) -> u32 {
        match self {
            Self::ConnectivityTest => 100,
            Self::Analysis => 500,
        }
    }
}

/// A fully built provider request: target URL plus JSON body
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub body: String,
}
