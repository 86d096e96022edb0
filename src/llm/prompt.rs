// src/llm/prompt.rs
// System prompts and user-content builders for the analysis and
// connectivity flows

use crate::analysis::DiffPayload;

/// Maximum diff text size to send upstream (in bytes)
const MAX_DIFF_TEXT: usize = 10_000;
/// Maximum serialized structured-diff size to send upstream (in bytes)
const MAX_DIFF_JSON: usize = 10_000;

/// Built-in system prompt for the analysis flow, used when the user has not
/// configured their own
pub const DEFAULT_SYSTEM_PROMPT: &str = "You analyze changes detected on monitored web pages. \
Judge how meaningful the change is to someone watching the page: content updates, price changes, \
and availability changes matter; formatting noise, timestamps, ads, and tracking parameters do not. \
Respond with a JSON object: {\"score\": <0-100>, \"reasoning\": \"<one or two sentences>\"}. \
Output ONLY the JSON object, no other text.";

/// System prompt for the connectivity check
pub const CONNECTIVITY_SYSTEM_PROMPT: &str = "You are a connectivity probe. \
Respond with a JSON object: {\"message\": \"<short greeting>\"}. \
Output ONLY the JSON object, no other text.";

/// User content for the connectivity check
pub const CONNECTIVITY_USER_CONTENT: &str =
    "Reply with a short message confirming you received this request.";

/// Build the user content for one analysis request.
///
/// Combines website identity with the diff's textual summary and its
/// structured representation, truncating oversized inputs.
pub fn analysis_context(website_name: &str, website_url: &str, diff: &DiffPayload) -> String {
    let text = truncate(&diff.text, MAX_DIFF_TEXT);

    let json = serde_json::to_string(&diff.json).unwrap_or_default();
    let json = truncate(&json, MAX_DIFF_JSON);

    format!(
        "Website: {} ({})\n\nDetected change:\n{}\n\nStructured diff:\n{}",
        website_name, website_url, text, json
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Back off to a char boundary
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...\n[truncated - {} more bytes]", &s[..end], s.len() - end)
}
