//! Error types for ReportView
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse`. Every failure is rendered as an
//! HTML page; nothing here is allowed to crash a request.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::render;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Required identifier missing from the query string (400)
    #[error("missing {concept}")]
    MissingIdentifier {
        /// Concept named on the error page, e.g. "Contact Information"
        concept: &'static str,
        /// Explanatory sentence shown under the heading
        detail: &'static str,
    },

    /// No report row / contact matched the identifier (404)
    #[error("report not found")]
    ReportNotFound,

    /// A row matched but carries no renderable content yet (404)
    #[error("report not ready")]
    ReportNotReady,

    /// Configuration error, e.g. a required secret is absent (500).
    /// The triggering message is echoed to the client.
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream returned a non-success response (500).
    /// Carries the upstream status and reason text, echoed to the client.
    #[error("{0}")]
    Upstream(String),

    /// OIDC exchange or state validation failed (500).
    /// Rendered as a generic page; detail stays in the server log.
    #[error("login failed")]
    LoginFailed,

    /// The identity provider could not be discovered at startup (500)
    #[error("single sign-on is not configured")]
    SsoUnavailable,

    /// HTTP client error reaching an upstream (500)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to an HTML error page
    ///
    /// Fetch-path failures echo their diagnostic text; auth-path
    /// failures render a generic page with no detail.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingIdentifier { concept, detail } => (
                StatusCode::BAD_REQUEST,
                render::missing_identifier_page(concept, detail),
            ),
            AppError::ReportNotFound => (StatusCode::NOT_FOUND, render::report_not_found_page()),
            AppError::ReportNotReady => (StatusCode::NOT_FOUND, render::report_not_ready_page()),
            AppError::LoginFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, render::login_failed_page())
            }
            AppError::SsoUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                render::sso_unavailable_page(),
            ),
            AppError::Config(msg) | AppError::Upstream(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, render::server_error_page(msg))
            }
            AppError::HttpClient(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                render::server_error_page(&err.to_string()),
            ),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                render::server_error_page(&err.to_string()),
            ),
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        (status, Html(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
