//! Chat-completions client used to turn pull-request diffs into review
//! feedback.
//!
//! Speaks the OpenAI-style REST surface:
//! - `POST {endpoint}/v1/chat/completions` — single response (`stream=false`)
//! - the same endpoint consumed as Server-Sent Events when `stream=true`
//!
//! Both paths return the same concatenated feedback text for the same
//! generated content; streaming only changes how the text arrives.

pub mod chat;
pub mod config;
pub mod errors;

pub use chat::ChatCompletionClient;
pub use config::CompletionConfig;
pub use errors::{CompletionError, CompletionResult};
