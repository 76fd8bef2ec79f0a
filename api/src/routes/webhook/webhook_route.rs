use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::Serialize;
use tracing::{debug, info};

use pr_review::review_pull_request;

use crate::core::app_state::AppState;
use crate::error_handler::AppResult;
use crate::routes::webhook::webhook_payload::WebhookEvent;

const EVENT_HEADER: &str = "X-GitHub-Event";
const HANDLED_ACTIONS: [&str; 2] = ["opened", "synchronize"];

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub message: &'static str,
}

const IGNORED: WebhookAck = WebhookAck {
    message: "Event ignored",
};
const COMPLETED: WebhookAck = WebhookAck {
    message: "PR review completed successfully",
};

/// POST /webhook
///
/// Validates the event, gathers PR coordinates, runs one review pass, and
/// acknowledges. Failures after validation surface as HTTP 500 with a
/// `{"detail": ...}` body.
pub async fn github_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<WebhookEvent>, JsonRejection>,
) -> AppResult<Json<WebhookAck>> {
    let event_kind = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if event_kind != "pull_request" {
        debug!(event = %event_kind, "ignoring non-pull-request event");
        return Ok(Json(IGNORED));
    }

    let Json(event) = payload?;

    let action = event.action.as_deref().unwrap_or_default();
    if !HANDLED_ACTIONS.contains(&action) {
        debug!(%action, "ignoring pull request action");
        return Ok(Json(IGNORED));
    }

    let pr = event.pull_request_ref()?;
    info!(pr = pr.number, %action, "processing pull request webhook");

    let outcome = review_pull_request(
        &state.http,
        &state.github_token,
        state.mode,
        state.llm.as_ref(),
        &pr,
    )
    .await?;
    debug!(
        files = outcome.files_total,
        sections = outcome.sections,
        skipped = outcome.skipped,
        "review pass finished"
    );

    Ok(Json(COMPLETED))
}
