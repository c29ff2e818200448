//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing authorization token")]
    MissingToken,

    /// Token is malformed, tampered with, signed with another key or expired.
    #[error("invalid token")]
    InvalidToken,

    /// Invalid credentials (wrong password or unknown brand and role).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Brand and role are already registered.
    #[error("account already exists")]
    AccountExists,

    /// A required registration field is blank.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Authenticated account no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// Token could not be produced.
    #[error("token signing failed")]
    Signing,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
