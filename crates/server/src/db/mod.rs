//! Durable storage for accounts, snapshots and row entries.
//!
//! # Schema: `sheets`
//!
//! ## Tables
//!
//! - `account` - Login identity (`brand`, `role`) and the `draft_snapshot_id` pointer
//! - `snapshot` - One row per draft or finalized save, with its highlight set
//! - `row_entry` - Cell-level `(field_key, field_value)` facts, cascaded with their snapshot
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p sheetkeep-cli -- migrate
//! ```
//!
//! # Transactions
//!
//! Every draft mutation runs inside a [`StoreTransaction`]. The first call in
//! such a transaction is [`StoreTransaction::lock_draft_pointer`], which holds
//! the account row until commit so that writers for the same account queue up
//! behind each other while other accounts are unaffected.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use sheetkeep_core::{
    AccountId, HighlightedRows, RowEntry, SnapshotContents, SnapshotId, SnapshotSummary,
};

use crate::models::account::{Account, NewAccount};

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate brand and role).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Which snapshots year-based browsing should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    /// List the live draft alongside finalized snapshots.
    pub include_drafts: bool,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            include_drafts: true,
        }
    }
}

/// Account, snapshot and row storage.
///
/// Reads that need no pointer consistency live here; anything that touches
/// the draft pointer goes through [`RecordStore::begin`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a transaction. Dropping it without commit rolls back.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Register an account. `Conflict` if the brand and role are taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;

    /// Look up an account and its password hash by login identity.
    async fn account_by_login(
        &self,
        brand: &str,
        role: &str,
    ) -> Result<Option<(Account, String)>, RepositoryError>;

    /// Look up an account by ID.
    async fn account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Distinct UTC creation years of the account's snapshots, newest first.
    async fn snapshot_years(
        &self,
        account: AccountId,
        policy: HistoryPolicy,
    ) -> Result<Vec<i32>, RepositoryError>;

    /// Summaries of the account's snapshots, newest first, optionally
    /// restricted to one UTC year.
    async fn snapshots(
        &self,
        account: AccountId,
        year: Option<i32>,
        policy: HistoryPolicy,
    ) -> Result<Vec<SnapshotSummary>, RepositoryError>;

    /// Snapshot contents, only if owned by `account`.
    async fn snapshot(
        &self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<Option<SnapshotContents>, RepositoryError>;

    /// Current draft pointer of the account, without locking.
    async fn draft_pointer(&self, account: AccountId)
    -> Result<Option<SnapshotId>, RepositoryError>;
}

/// One all-or-nothing unit of work against a [`RecordStore`].
#[async_trait]
pub trait StoreTransaction: Send {
    /// Lock the account row and read its draft pointer.
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    async fn lock_draft_pointer(
        &mut self,
        account: AccountId,
    ) -> Result<Option<SnapshotId>, RepositoryError>;

    /// Point the account's draft at `draft`, or clear it.
    async fn set_draft_pointer(
        &mut self,
        account: AccountId,
        draft: Option<SnapshotId>,
    ) -> Result<(), RepositoryError>;

    /// Create a snapshot stamped with the current time.
    async fn insert_snapshot(
        &mut self,
        account: AccountId,
        highlights: &HighlightedRows,
    ) -> Result<SnapshotSummary, RepositoryError>;

    /// Overwrite the highlight set of a snapshot owned by `account`.
    ///
    /// Returns the snapshot's creation time, or `None` if no such snapshot
    /// belongs to the account.
    async fn update_highlights(
        &mut self,
        account: AccountId,
        id: SnapshotId,
        highlights: &HighlightedRows,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError>;

    /// Remove every row entry of a snapshot.
    async fn delete_entries(&mut self, id: SnapshotId) -> Result<u64, RepositoryError>;

    /// Insert entries, numbering positions from zero in slice order.
    async fn insert_entries(
        &mut self,
        id: SnapshotId,
        entries: &[RowEntry],
    ) -> Result<(), RepositoryError>;

    /// Delete a snapshot owned by `account`; its entries and any draft pointer
    /// referencing it go with it. Returns whether a row was deleted.
    async fn delete_snapshot(
        &mut self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<bool, RepositoryError>;

    /// Make every change in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
