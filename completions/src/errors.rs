//! Unified error type for the completions client.

use thiserror::Error;

/// Crate-wide result alias.
pub type CompletionResult<T> = Result<T, CompletionError>;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key was configured.
    #[error("completion api key is not configured")]
    MissingApiKey,

    /// Endpoint is empty or does not use http/https.
    #[error("invalid completion endpoint: {0}")]
    InvalidEndpoint(String),

    /// A numeric environment variable failed to parse.
    #[error("invalid number in {0}")]
    InvalidNumber(&'static str),

    /// Non-success HTTP status from the completion API.
    #[error("completion api returned status {status}: {snippet}")]
    HttpStatus { status: u16, snippet: String },

    /// Response body did not match the expected shape.
    #[error("failed to decode completion response: {0}")]
    Decode(String),

    /// A well-formed response carried no usable choices.
    #[error("completion response contained no choices")]
    EmptyChoices,

    /// Request exceeded the configured timeout.
    #[error("completion request timed out")]
    Timeout,

    /// Transport-level failure (DNS/connect/reset).
    #[error("completion transport error: {0}")]
    Transport(String),

    /// Failure while consuming the SSE stream.
    #[error("completion event stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}

/// Truncates an upstream error body so it stays readable in logs and error
/// messages.
pub(crate) fn make_snippet(body: &str) -> String {
    const MAX_CHARS: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let mut s: String = trimmed.chars().take(MAX_CHARS).collect();
        s.push_str("...");
        s
    }
}
