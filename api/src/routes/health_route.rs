use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// GET /
///
/// Verifies the server is running.
pub async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "GitHub PR Reviewer is running",
    })
}

/// GET /health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "healthy" })
}
