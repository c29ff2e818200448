//! Errors shared by the draft and snapshot services.

use thiserror::Error;

use sheetkeep_core::CodecError;

use crate::db::RepositoryError;

/// Errors that can occur while reading or writing sheet data.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Row payload failed validation; nothing was written.
    #[error("invalid row data: {0}")]
    InvalidRows(#[from] CodecError),

    /// Request shape was wrong; nothing was written.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// No draft, no snapshots for the year, or not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// The store rejected or failed the operation. Never retried.
    #[error("storage failure: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for SheetError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("account not found".to_owned()),
            other => Self::Storage(other),
        }
    }
}
