//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! sk-cli account create --brand acme --role editor --password '...'
//! ```
//!
//! The password may also come from `SHEETS_ACCOUNT_PASSWORD` to keep it out
//! of shell history.

use sheetkeep_server::db::{self, PgRecordStore};
use sheetkeep_server::services::{AuthError, register_account};
use thiserror::Error;

use super::{CommandError, database_url};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Register a new account and return its ID.
pub async fn create(brand: &str, role: &str, password: &str) -> Result<i32, AccountError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let store = PgRecordStore::new(pool);

    let account = register_account(&store, brand, role, password).await?;

    tracing::info!(
        "Account created successfully! ID: {}, Brand: {}, Role: {}",
        account.id,
        account.brand,
        account.role
    );

    Ok(account.id.as_i32())
}
