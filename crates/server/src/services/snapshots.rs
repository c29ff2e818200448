//! Read-side access to an account's snapshot history.

use tracing::instrument;

use sheetkeep_core::{AccountId, SnapshotContents, SnapshotId, SnapshotSummary};

use super::SheetError;
use crate::db::{HistoryPolicy, RecordStore};

/// Browses years, snapshots and snapshot contents for one account at a time.
pub struct SnapshotQuery<'a> {
    store: &'a dyn RecordStore,
    policy: HistoryPolicy,
}

impl<'a> SnapshotQuery<'a> {
    /// Create a query service with the given history policy.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, policy: HistoryPolicy) -> Self {
        Self { store, policy }
    }

    /// Distinct creation years, newest first. May be empty.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_years(&self, account: AccountId) -> Result<Vec<i32>, SheetError> {
        Ok(self.store.snapshot_years(account, self.policy).await?)
    }

    /// Snapshots created in `year`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the account has no snapshots that
    /// year, and `SheetError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_snapshots(
        &self,
        account: AccountId,
        year: i32,
    ) -> Result<Vec<SnapshotSummary>, SheetError> {
        let snapshots = self.store.snapshots(account, Some(year), self.policy).await?;
        if snapshots.is_empty() {
            return Err(SheetError::NotFound(format!(
                "no records found for year {year}"
            )));
        }
        Ok(snapshots)
    }

    /// Every snapshot of the account, newest first. May be empty.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self, account: AccountId) -> Result<Vec<SnapshotSummary>, SheetError> {
        Ok(self.store.snapshots(account, None, self.policy).await?)
    }

    /// Full contents of a snapshot owned by `account`.
    ///
    /// A snapshot that exists but belongs to another account is reported
    /// exactly like one that does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::NotFound` if the snapshot is missing or not owned
    /// by the account, and `SheetError::Storage` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_snapshot(
        &self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<SnapshotContents, SheetError> {
        self.store.snapshot(account, id).await?.ok_or_else(|| {
            SheetError::NotFound(format!(
                "no data found for snapshot {id} or unauthorized access"
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, TimeZone, Utc};

    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::models::account::NewAccount;
    use crate::services::DraftManager;
    use sheetkeep_core::{HighlightedRows, RowEntry};

    async fn account(store: &MemoryRecordStore, brand: &str) -> AccountId {
        store
            .create_account(NewAccount {
                brand: brand.to_owned(),
                role: "viewer".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
            .id
    }

    async fn seed(
        store: &MemoryRecordStore,
        account: AccountId,
        y: i32,
        m: u32,
        d: u32,
    ) -> SnapshotId {
        store
            .seed_snapshot(
                account,
                Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
                vec![RowEntry::new("R1C1", format!("{y}-{m}-{d}"))],
                HighlightedRows::empty(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_years_descending_without_duplicates() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        seed(&store, a1, 2024, 3, 1).await;
        seed(&store, a1, 2023, 6, 1).await;
        seed(&store, a1, 2025, 1, 1).await;
        seed(&store, a1, 2024, 9, 1).await;

        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        assert_eq!(query.list_years(a1).await.unwrap(), vec![2025, 2024, 2023]);
    }

    #[tokio::test]
    async fn test_years_empty_for_new_account() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        assert!(query.list_years(a1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshots_for_year_newest_first() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        let march = seed(&store, a1, 2024, 3, 1).await;
        let sept = seed(&store, a1, 2024, 9, 1).await;
        seed(&store, a1, 2023, 6, 1).await;

        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        let listed = query.list_snapshots(a1, 2024).await.unwrap();
        let ids: Vec<SnapshotId> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![sept, march]);
        assert!(listed.iter().all(|s| s.year() == 2024 && !s.is_draft));
    }

    #[tokio::test]
    async fn test_snapshots_for_empty_year_is_not_found() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        seed(&store, a1, 2024, 3, 1).await;

        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        assert!(matches!(
            query.list_snapshots(a1, 2019).await,
            Err(SheetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_owned_by_other_account_is_not_found() {
        let store = MemoryRecordStore::new();
        let a = account(&store, "acme").await;
        let b = account(&store, "globex").await;
        let id = seed(&store, a, 2024, 3, 1).await;

        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        assert!(query.get_snapshot(a, id).await.is_ok());
        assert!(matches!(
            query.get_snapshot(b, id).await,
            Err(SheetError::NotFound(_))
        ));
        assert!(query.list_years(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_snapshot_returns_entries_in_order() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        let entries = vec![
            RowEntry::new("R2C1", "b"),
            RowEntry::new("R1C1", "a"),
            RowEntry::new("R1C2", ""),
        ];
        let highlights = HighlightedRows::new([1]).unwrap();
        let saved = DraftManager::new(&store)
            .promote_draft(a1, &entries, &highlights)
            .await
            .unwrap();

        let query = SnapshotQuery::new(&store, HistoryPolicy::default());
        let contents = query.get_snapshot(a1, saved.id).await.unwrap();
        assert_eq!(contents.entries, entries);
        assert_eq!(contents.highlighted_rows, highlights);
    }

    #[tokio::test]
    async fn test_history_policy_controls_draft_visibility() {
        let store = MemoryRecordStore::new();
        let a1 = account(&store, "acme").await;
        seed(&store, a1, 2020, 5, 5).await;
        let draft = DraftManager::new(&store)
            .save_draft(a1, &[RowEntry::new("R1C1", "wip")], &HighlightedRows::empty())
            .await
            .unwrap();
        let this_year = draft.created_at.year();

        let with_drafts = SnapshotQuery::new(&store, HistoryPolicy { include_drafts: true });
        assert_eq!(with_drafts.list_years(a1).await.unwrap(), vec![this_year, 2020]);
        let listed = with_drafts.list_snapshots(a1, this_year).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_draft);

        let without = SnapshotQuery::new(&store, HistoryPolicy { include_drafts: false });
        assert_eq!(without.list_years(a1).await.unwrap(), vec![2020]);
        assert!(matches!(
            without.list_snapshots(a1, this_year).await,
            Err(SheetError::NotFound(_))
        ));
        assert_eq!(without.list_all(a1).await.unwrap().len(), 1);
        assert_eq!(with_drafts.list_all(a1).await.unwrap().len(), 2);
    }
}
