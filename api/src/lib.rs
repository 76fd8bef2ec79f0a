//! HTTP surface for the GitHub PR reviewer.

use std::sync::Arc;

mod core;
mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;

pub use crate::error_handler::{AppError, AppResult};

use crate::core::app_state::AppState;
use crate::routes::health_route::{health, root};
use crate::routes::webhook::webhook_route::github_webhook;

/// Loads configuration, binds the listener, and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let state = Arc::new(AppState::from_env()?);
    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    tracing::info!(%addr, "GitHub PR Reviewer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Builds the application router; separate from `start` so tests can drive
/// it directly.
fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(github_webhook))
        .with_state(state)
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
}
