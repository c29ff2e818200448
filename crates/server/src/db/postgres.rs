//! `PostgreSQL` record store.
//!
//! Queries are built at runtime with `query_as` + `bind` so the crate builds
//! without a live database. Database-backed tests live in the
//! integration-tests crate and are ignored unless a database is available.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use sheetkeep_core::{
    AccountId, HighlightedRows, RowEntry, SnapshotContents, SnapshotId, SnapshotSummary,
};

use super::{HistoryPolicy, RecordStore, RepositoryError, StoreTransaction};
use crate::models::account::{Account, NewAccount};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    brand: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: SnapshotId,
    created_at: DateTime<Utc>,
    is_draft: bool,
}

impl From<SummaryRow> for SnapshotSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            is_draft: row.is_draft,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HeaderRow {
    id: SnapshotId,
    created_at: DateTime<Utc>,
    highlighted_rows: Vec<i32>,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    field_key: String,
    field_value: String,
}

fn decode_highlights(id: SnapshotId, values: &[i32]) -> Result<HighlightedRows, RepositoryError> {
    HighlightedRows::from_db(values).map_err(|e| {
        RepositoryError::DataCorruption(format!("snapshot {id} highlight set: {e}"))
    })
}

/// Record store backed by the `sheets` schema.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, account), fields(brand = %account.brand, role = %account.role))]
    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let row: AccountRow = sqlx::query_as(
            r"
            INSERT INTO sheets.account (brand, role, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, brand, role, created_at
            ",
        )
        .bind(&account.brand)
        .bind(&account.role)
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("brand and role already registered".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        debug!(id = %row.id, "Created account");
        Ok(row.into())
    }

    async fn account_by_login(
        &self,
        brand: &str,
        role: &str,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row: Option<(AccountId, String, String, DateTime<Utc>, String)> = sqlx::query_as(
            r"
            SELECT id, brand, role, created_at, password_hash
            FROM sheets.account
            WHERE brand = $1 AND role = $2
            ",
        )
        .bind(brand)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, brand, role, created_at, hash)| {
            (
                Account {
                    id,
                    brand,
                    role,
                    created_at,
                },
                hash,
            )
        }))
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r"
            SELECT id, brand, role, created_at
            FROM sheets.account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[instrument(skip(self))]
    async fn snapshot_years(
        &self,
        account: AccountId,
        policy: HistoryPolicy,
    ) -> Result<Vec<i32>, RepositoryError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r"
            SELECT DISTINCT EXTRACT(YEAR FROM s.created_at AT TIME ZONE 'UTC')::INTEGER AS year
            FROM sheets.snapshot s
            JOIN sheets.account a ON a.id = s.account_id
            WHERE s.account_id = $1
              AND ($2 OR a.draft_snapshot_id IS DISTINCT FROM s.id)
            ORDER BY year DESC
            ",
        )
        .bind(account)
        .bind(policy.include_drafts)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(year,)| year).collect())
    }

    #[instrument(skip(self))]
    async fn snapshots(
        &self,
        account: AccountId,
        year: Option<i32>,
        policy: HistoryPolicy,
    ) -> Result<Vec<SnapshotSummary>, RepositoryError> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r"
            SELECT s.id, s.created_at,
                   COALESCE(a.draft_snapshot_id = s.id, FALSE) AS is_draft
            FROM sheets.snapshot s
            JOIN sheets.account a ON a.id = s.account_id
            WHERE s.account_id = $1
              AND ($2::INTEGER IS NULL
                   OR EXTRACT(YEAR FROM s.created_at AT TIME ZONE 'UTC')::INTEGER = $2)
              AND ($3 OR a.draft_snapshot_id IS DISTINCT FROM s.id)
            ORDER BY s.created_at DESC, s.id DESC
            ",
        )
        .bind(account)
        .bind(year)
        .bind(policy.include_drafts)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SnapshotSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn snapshot(
        &self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<Option<SnapshotContents>, RepositoryError> {
        // Header and entries must come from the same view of the data, or a
        // concurrent promotion could hand back a header with no rows.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let header: Option<HeaderRow> = sqlx::query_as(
            r"
            SELECT id, created_at, highlighted_rows
            FROM sheets.snapshot
            WHERE id = $1 AND account_id = $2
            ",
        )
        .bind(id)
        .bind(account)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let entries: Vec<EntryRow> = sqlx::query_as(
            r"
            SELECT field_key, field_value
            FROM sheets.row_entry
            WHERE snapshot_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(SnapshotContents {
            id: header.id,
            created_at: header.created_at,
            highlighted_rows: decode_highlights(header.id, &header.highlighted_rows)?,
            entries: entries
                .into_iter()
                .map(|e| RowEntry::new(e.field_key, e.field_value))
                .collect(),
        }))
    }

    async fn draft_pointer(
        &self,
        account: AccountId,
    ) -> Result<Option<SnapshotId>, RepositoryError> {
        let row: Option<(Option<SnapshotId>,)> =
            sqlx::query_as("SELECT draft_snapshot_id FROM sheets.account WHERE id = $1")
                .bind(account)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(pointer,)| pointer))
    }
}

/// Transaction over a pooled connection.
struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn lock_draft_pointer(
        &mut self,
        account: AccountId,
    ) -> Result<Option<SnapshotId>, RepositoryError> {
        let row: Option<(Option<SnapshotId>,)> = sqlx::query_as(
            r"
            SELECT draft_snapshot_id
            FROM sheets.account
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(account)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|(pointer,)| pointer).ok_or(RepositoryError::NotFound)
    }

    async fn set_draft_pointer(
        &mut self,
        account: AccountId,
        draft: Option<SnapshotId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sheets.account SET draft_snapshot_id = $2 WHERE id = $1")
            .bind(account)
            .bind(draft)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn insert_snapshot(
        &mut self,
        account: AccountId,
        highlights: &HighlightedRows,
    ) -> Result<SnapshotSummary, RepositoryError> {
        let (id, created_at): (SnapshotId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO sheets.snapshot (account_id, highlighted_rows)
            VALUES ($1, $2)
            RETURNING id, created_at
            ",
        )
        .bind(account)
        .bind(highlights.to_db())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(SnapshotSummary {
            id,
            created_at,
            is_draft: false,
        })
    }

    async fn update_highlights(
        &mut self,
        account: AccountId,
        id: SnapshotId,
        highlights: &HighlightedRows,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r"
            UPDATE sheets.snapshot
            SET highlighted_rows = $3
            WHERE id = $1 AND account_id = $2
            RETURNING created_at
            ",
        )
        .bind(id)
        .bind(account)
        .bind(highlights.to_db())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(created_at,)| created_at))
    }

    async fn delete_entries(&mut self, id: SnapshotId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sheets.row_entry WHERE snapshot_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_entries(
        &mut self,
        id: SnapshotId,
        entries: &[RowEntry],
    ) -> Result<(), RepositoryError> {
        let mut positions = Vec::with_capacity(entries.len());
        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let position = i32::try_from(i)
                .map_err(|_| RepositoryError::Conflict("too many row entries".to_owned()))?;
            positions.push(position);
            keys.push(entry.field_key.as_str());
            values.push(entry.field_value.as_str());
        }

        sqlx::query(
            r"
            INSERT INTO sheets.row_entry (snapshot_id, position, field_key, field_value)
            SELECT $1, t.position, t.field_key, t.field_value
            FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::TEXT[]) AS t(position, field_key, field_value)
            ",
        )
        .bind(id)
        .bind(&positions)
        .bind(&keys)
        .bind(&values)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_snapshot(
        &mut self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM sheets.snapshot WHERE id = $1 AND account_id = $2")
            .bind(id)
            .bind(account)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
