//! Error taxonomy for the PR review pipeline.
//!
//! Per-file errors are caught inside the structural loop and skip only that
//! file; everything else propagates to the webhook boundary.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-success status from GitHub; carries the raw response body.
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Malformed or missing base64 content in a contents response.
    #[error("content format error: {0}")]
    ContentFormat(String),

    /// Required webhook payload field is absent.
    #[error("payload error: missing field `{0}`")]
    Payload(&'static str),

    /// Upstream call exceeded the client timeout.
    #[error("upstream call timed out")]
    Timeout,

    /// Transport failure without an HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Completion API failure (narrative mode).
    #[error(transparent)]
    Completion(#[from] completions::CompletionError),

    /// Narrative mode was selected without a configured completion client.
    #[error("narrative review mode requires a configured completion client")]
    CompletionUnavailable,
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(e.to_string())
        }
    }
}
