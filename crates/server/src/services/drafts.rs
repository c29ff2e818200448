//! Draft lifecycle: save, replace, fetch and promote.
//!
//! Each account has at most one draft, reachable through
//! `account.draft_snapshot_id`. Saving a draft either opens one or replaces
//! the whole entry set of the existing one in place. Promoting writes a fresh
//! finalized snapshot and then tears the old draft down, all inside a single
//! transaction so no observer sees a half-applied state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use sheetkeep_core::{
    AccountId, HighlightedRows, RowCodec, RowEntry, SnapshotContents, SnapshotId,
    SnapshotSummary,
};

use super::SheetError;
use crate::db::RecordStore;

/// Outcome of a draft save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSaved {
    pub snapshot_id: SnapshotId,
    pub created_at: DateTime<Utc>,
    /// True when this save opened a new draft rather than replacing one.
    pub created: bool,
}

/// Enforces the one-draft-per-account rules on top of a [`RecordStore`].
pub struct DraftManager<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> DraftManager<'a> {
    /// Create a draft manager over a store.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Save `rows` as the account's draft.
    ///
    /// Opens a draft if none exists. Otherwise the existing draft keeps its ID
    /// and creation time, its entries are replaced wholesale and its highlight
    /// set is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::InvalidRows` before touching storage if `rows` is
    /// empty or has empty or duplicate keys, `SheetError::NotFound` if the
    /// account does not exist, and `SheetError::Storage` if the transaction
    /// fails.
    #[instrument(skip(self, rows, highlights), fields(rows = rows.len()))]
    pub async fn save_draft(
        &self,
        account: AccountId,
        rows: &[RowEntry],
        highlights: &HighlightedRows,
    ) -> Result<DraftSaved, SheetError> {
        RowCodec::validate(rows)?;

        let mut tx = self.store.begin().await?;
        let pointer = tx.lock_draft_pointer(account).await?;

        let existing = match pointer {
            Some(id) => tx
                .update_highlights(account, id, highlights)
                .await?
                .map(|created_at| (id, created_at)),
            None => None,
        };

        let saved = if let Some((id, created_at)) = existing {
            tx.delete_entries(id).await?;
            DraftSaved {
                snapshot_id: id,
                created_at,
                created: false,
            }
        } else {
            if let Some(stale) = pointer {
                warn!(snapshot_id = %stale, "Draft pointer referenced a missing snapshot, opening a new draft");
            }
            let snapshot = tx.insert_snapshot(account, highlights).await?;
            tx.set_draft_pointer(account, Some(snapshot.id)).await?;
            DraftSaved {
                snapshot_id: snapshot.id,
                created_at: snapshot.created_at,
                created: true,
            }
        };

        tx.insert_entries(saved.snapshot_id, rows).await?;
        tx.commit().await?;

        info!(
            snapshot_id = %saved.snapshot_id,
            created = saved.created,
            "Draft saved"
        );
        Ok(saved)
    }

    /// Finalize `rows` as a new snapshot and discard the account's draft.
    ///
    /// The new snapshot gets a fresh ID and timestamp and does not depend on
    /// the draft's contents. The draft, if any, is deleted after the new
    /// snapshot and its entries are written, in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::InvalidRows` on an invalid payload,
    /// `SheetError::NotFound` if the account does not exist, and
    /// `SheetError::Storage` if the transaction fails.
    #[instrument(skip(self, rows, highlights), fields(rows = rows.len()))]
    pub async fn promote_draft(
        &self,
        account: AccountId,
        rows: &[RowEntry],
        highlights: &HighlightedRows,
    ) -> Result<SnapshotSummary, SheetError> {
        RowCodec::validate(rows)?;

        let mut tx = self.store.begin().await?;
        let draft = tx.lock_draft_pointer(account).await?;

        let snapshot = tx.insert_snapshot(account, highlights).await?;
        tx.insert_entries(snapshot.id, rows).await?;

        if let Some(draft_id) = draft {
            let deleted = tx.delete_snapshot(account, draft_id).await?;
            if !deleted {
                warn!(snapshot_id = %draft_id, "Draft pointer referenced a missing snapshot");
            }
            tx.set_draft_pointer(account, None).await?;
        }

        tx.commit().await?;

        info!(
            snapshot_id = %snapshot.id,
            replaced_draft = ?draft,
            "Draft promoted"
        );
        Ok(snapshot)
    }

    /// Fetch the account's draft.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the account has no draft, or if the
    /// pointer names a snapshot that is missing or belongs to someone else.
    #[instrument(skip(self))]
    pub async fn get_draft(&self, account: AccountId) -> Result<SnapshotContents, SheetError> {
        let Some(id) = self.store.draft_pointer(account).await? else {
            return Err(SheetError::NotFound("no draft found".to_owned()));
        };

        self.store.snapshot(account, id).await?.ok_or_else(|| {
            warn!(snapshot_id = %id, "Draft pointer does not resolve for this account");
            SheetError::NotFound("draft not found or unauthorized access".to_owned())
        })
    }
}
