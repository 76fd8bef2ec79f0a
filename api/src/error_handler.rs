use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value in environment variable {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Completion client construction failure at startup.
    #[error(transparent)]
    Completion(#[from] completions::CompletionError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request handling ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Review pipeline failure surfaced at the webhook boundary.
    #[error(transparent)]
    Review(#[from] pr_review::errors::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // Startup-only variants and pipeline failures all surface as 500.
            AppError::MissingEnv(_)
            | AppError::InvalidEnv { .. }
            | AppError::HttpClient(_)
            | AppError::Completion(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Review(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body: `{"detail": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
