//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::SheetError;
use crate::services::auth::AuthError;

/// Application-level error type for the sheets server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Draft or snapshot operation failed.
    #[error("Sheet error: {0}")]
    Sheets(#[from] SheetError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Sheets(err) => match err {
                SheetError::InvalidRows(_) | SheetError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                SheetError::NotFound(_) => StatusCode::NOT_FOUND,
                SheetError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::MissingToken | AuthError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::InvalidToken => StatusCode::FORBIDDEN,
                AuthError::AccountExists => StatusCode::CONFLICT,
                AuthError::MissingField(_) | AuthError::WeakPassword(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::Signing | AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Sheets(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::MissingToken => "Access denied. No token provided.".to_string(),
                AuthError::InvalidToken => "Invalid token".to_string(),
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::AccountExists => {
                    "An account with this brand and role already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                other => other.to_string(),
            },
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an authenticated account.
pub fn set_sentry_user(account_id: &impl ToString, brand: &str, role: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            username: Some(format!("{brand}/{role}")),
            ..Default::default()
        }));
    });
}
