use std::time::Duration;

use completions::{ChatCompletionClient, CompletionConfig};
use pr_review::ReviewMode;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Process-wide outbound HTTP client, reused across requests and never
    /// closed mid-request.
    pub http: reqwest::Client,
    /// GitHub bearer token.
    pub github_token: String,
    /// How webhook reviews produce their comment.
    pub mode: ReviewMode,
    /// Completion client; present whenever an API key is configured and
    /// always required for narrative mode.
    pub llm: Option<ChatCompletionClient>,
}

impl AppState {
    /// Loads shared state from environment variables once at startup.
    pub fn from_env() -> Result<Self, AppError> {
        let github_token =
            std::env::var("GITHUB_TOKEN").map_err(|_| AppError::MissingEnv("GITHUB_TOKEN"))?;

        let mode = match std::env::var("REVIEW_MODE") {
            Ok(raw) => raw
                .parse::<ReviewMode>()
                .map_err(|reason| AppError::InvalidEnv {
                    var: "REVIEW_MODE",
                    reason,
                })?,
            Err(_) => ReviewMode::Narrative,
        };

        let llm_cfg = CompletionConfig::from_env()?;
        let llm = if llm_cfg.api_key.is_some() {
            Some(ChatCompletionClient::new(llm_cfg)?)
        } else if mode == ReviewMode::Narrative {
            return Err(AppError::MissingEnv("COMPLETION_API_KEY"));
        } else {
            None
        };

        // Upstream calls get a bounded timeout so a stalled GitHub request
        // cannot hang a webhook delivery indefinitely.
        let http = reqwest::Client::builder()
            .user_agent("gh-pr-reviewer/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            http,
            github_token,
            mode,
            llm,
        })
    }
}
