//! Environment-driven configuration for the completions client.

use std::str::FromStr;

use crate::errors::{CompletionError, CompletionResult};

/// Configuration for chat-completion requests.
///
/// Generation parameters default to the values the reviewer has always used
/// (temperature 1.0, top_p 1.0, 1024 max tokens); everything can be
/// overridden through the `COMPLETION_*` environment variables.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// API base, e.g. "https://api.groq.com/openai". The client appends
    /// `/v1/chat/completions`.
    pub endpoint: String,
    /// Bearer key; requests cannot be made without one.
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Per-request timeout; defaults to 60 s when unset.
    pub timeout_secs: Option<u64>,
    /// Consume the response as an SSE stream instead of one JSON body.
    pub stream: bool,
}

impl CompletionConfig {
    /// Reads the configuration from `COMPLETION_*` environment variables.
    pub fn from_env() -> CompletionResult<Self> {
        Ok(Self {
            model: env_or("COMPLETION_MODEL", "llama-3.2-11b-text-preview"),
            endpoint: env_or("COMPLETION_API_BASE", "https://api.groq.com/openai"),
            api_key: std::env::var("COMPLETION_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            temperature: parse_var("COMPLETION_TEMPERATURE")?.or(Some(1.0)),
            top_p: parse_var("COMPLETION_TOP_P")?.or(Some(1.0)),
            max_tokens: parse_var("COMPLETION_MAX_TOKENS")?.or(Some(1024)),
            timeout_secs: parse_var("COMPLETION_TIMEOUT_SECS")?,
            stream: std::env::var("COMPLETION_STREAM")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(var: &'static str) -> CompletionResult<Option<T>> {
    match std::env::var(var) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| CompletionError::InvalidNumber(var)),
        _ => Ok(None),
    }
}
