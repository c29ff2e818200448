//! In-process record store.
//!
//! Mirrors the `sheets` schema closely enough to exercise the draft rules
//! without a database: snapshot deletion cascades to entries and clears any
//! draft pointer aimed at it, and `(brand, role)` is unique.
//!
//! A transaction owns the store's mutex for its whole lifetime and works on a
//! staged copy of the state, which replaces the live state only on commit.
//! Transactions are therefore fully serialized. Entry lists are shared between
//! the live and staged copies and cloned only when a transaction rewrites them,
//! so opening a transaction costs one map copy rather than a copy of every row.
//!
//! Meant for tests and single-user local runs; production uses Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use sheetkeep_core::{
    AccountId, HighlightedRows, RowEntry, SnapshotContents, SnapshotId, SnapshotSummary,
};

use super::{HistoryPolicy, RecordStore, RepositoryError, StoreTransaction};
use crate::models::account::{Account, NewAccount};

#[derive(Debug, Clone)]
struct AccountRecord {
    account: Account,
    password_hash: String,
    draft: Option<SnapshotId>,
}

#[derive(Debug, Clone)]
struct SnapshotRecord {
    account: AccountId,
    created_at: DateTime<Utc>,
    highlights: HighlightedRows,
    entries: Arc<Vec<RowEntry>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_account: i32,
    next_snapshot: i32,
    accounts: HashMap<AccountId, AccountRecord>,
    snapshots: HashMap<SnapshotId, SnapshotRecord>,
}

impl MemoryState {
    fn draft_of(&self, account: AccountId) -> Option<SnapshotId> {
        self.accounts.get(&account).and_then(|a| a.draft)
    }

    fn summaries(
        &self,
        account: AccountId,
        policy: HistoryPolicy,
    ) -> impl Iterator<Item = SnapshotSummary> + '_ {
        let draft = self.draft_of(account);
        self.snapshots
            .iter()
            .filter(move |(_, s)| s.account == account)
            .map(move |(&id, s)| SnapshotSummary {
                id,
                created_at: s.created_at,
                is_draft: draft == Some(id),
            })
            .filter(move |s| policy.include_drafts || !s.is_draft)
    }

    fn contents(&self, account: AccountId, id: SnapshotId) -> Option<SnapshotContents> {
        self.snapshots
            .get(&id)
            .filter(|s| s.account == account)
            .map(|s| SnapshotContents {
                id,
                created_at: s.created_at,
                entries: s.entries.to_vec(),
                highlighted_rows: s.highlights.clone(),
            })
    }

    fn insert_snapshot(
        &mut self,
        account: AccountId,
        created_at: DateTime<Utc>,
        highlights: HighlightedRows,
        entries: Vec<RowEntry>,
    ) -> SnapshotId {
        self.next_snapshot += 1;
        let id = SnapshotId::new(self.next_snapshot);
        self.snapshots.insert(
            id,
            SnapshotRecord {
                account,
                created_at,
                highlights,
                entries: Arc::new(entries),
            },
        );
        id
    }
}

/// Record store kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finalized snapshot with an explicit creation time.
    ///
    /// Used to build history that spans several years.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn seed_snapshot(
        &self,
        account: AccountId,
        created_at: DateTime<Utc>,
        entries: Vec<RowEntry>,
        highlights: HighlightedRows,
    ) -> Result<SnapshotId, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&account) {
            return Err(RepositoryError::NotFound);
        }
        Ok(state.insert_snapshot(account, created_at, highlights, entries))
    }

    /// Number of snapshots owned by the account, drafts included.
    pub async fn snapshot_count(&self, account: AccountId) -> usize {
        let state = self.state.lock().await;
        state
            .snapshots
            .values()
            .filter(|s| s.account == account)
            .count()
    }

    /// Total row entries across all snapshots.
    pub async fn entry_count(&self) -> usize {
        let state = self.state.lock().await;
        state.snapshots.values().map(|s| s.entries.len()).sum()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, RepositoryError> {
        let live = Arc::clone(&self.state).lock_owned().await;
        let staged = live.clone();
        Ok(Box::new(MemoryTransaction { live, staged }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut state = self.state.lock().await;
        let taken = state
            .accounts
            .values()
            .any(|a| a.account.brand == account.brand && a.account.role == account.role);
        if taken {
            return Err(RepositoryError::Conflict(
                "brand and role already registered".to_owned(),
            ));
        }

        state.next_account += 1;
        let created = Account {
            id: AccountId::new(state.next_account),
            brand: account.brand,
            role: account.role,
            created_at: Utc::now(),
        };
        state.accounts.insert(
            created.id,
            AccountRecord {
                account: created.clone(),
                password_hash: account.password_hash,
                draft: None,
            },
        );
        Ok(created)
    }

    async fn account_by_login(
        &self,
        brand: &str,
        role: &str,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.account.brand == brand && a.account.role == role)
            .map(|a| (a.account.clone(), a.password_hash.clone())))
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&id).map(|a| a.account.clone()))
    }

    async fn snapshot_years(
        &self,
        account: AccountId,
        policy: HistoryPolicy,
    ) -> Result<Vec<i32>, RepositoryError> {
        let state = self.state.lock().await;
        let mut years: Vec<i32> = state
            .summaries(account, policy)
            .map(|s| s.created_at.year())
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn snapshots(
        &self,
        account: AccountId,
        year: Option<i32>,
        policy: HistoryPolicy,
    ) -> Result<Vec<SnapshotSummary>, RepositoryError> {
        let state = self.state.lock().await;
        let mut list: Vec<SnapshotSummary> = state
            .summaries(account, policy)
            .filter(|s| year.is_none_or(|y| s.created_at.year() == y))
            .collect();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(list)
    }

    async fn snapshot(
        &self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<Option<SnapshotContents>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.contents(account, id))
    }

    async fn draft_pointer(
        &self,
        account: AccountId,
    ) -> Result<Option<SnapshotId>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.draft_of(account))
    }
}

struct MemoryTransaction {
    live: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTransaction {
    fn account_mut(&mut self, account: AccountId) -> Result<&mut AccountRecord, RepositoryError> {
        self.staged
            .accounts
            .get_mut(&account)
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_draft_pointer(
        &mut self,
        account: AccountId,
    ) -> Result<Option<SnapshotId>, RepositoryError> {
        // The whole store is already held by this transaction.
        Ok(self.account_mut(account)?.draft)
    }

    async fn set_draft_pointer(
        &mut self,
        account: AccountId,
        draft: Option<SnapshotId>,
    ) -> Result<(), RepositoryError> {
        if let Some(id) = draft
            && !self.staged.snapshots.contains_key(&id)
        {
            return Err(RepositoryError::Conflict(format!(
                "snapshot {id} does not exist"
            )));
        }
        self.account_mut(account)?.draft = draft;
        Ok(())
    }

    async fn insert_snapshot(
        &mut self,
        account: AccountId,
        highlights: &HighlightedRows,
    ) -> Result<SnapshotSummary, RepositoryError> {
        if !self.staged.accounts.contains_key(&account) {
            return Err(RepositoryError::NotFound);
        }
        let created_at = Utc::now();
        let id = self
            .staged
            .insert_snapshot(account, created_at, highlights.clone(), Vec::new());
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
        Ok(self
            .staged
            .snapshots
            .get_mut(&id)
            .filter(|s| s.account == account)
            .map(|s| {
                s.highlights = highlights.clone();
                s.created_at
            }))
    }

    async fn delete_entries(&mut self, id: SnapshotId) -> Result<u64, RepositoryError> {
        Ok(self.staged.snapshots.get_mut(&id).map_or(0, |s| {
            let removed = s.entries.len() as u64;
            s.entries = Arc::default();
            removed
        }))
    }

    async fn insert_entries(
        &mut self,
        id: SnapshotId,
        entries: &[RowEntry],
    ) -> Result<(), RepositoryError> {
        let snapshot = self
            .staged
            .snapshots
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        let duplicate = entries
            .iter()
            .find(|e| snapshot.entries.iter().any(|x| x.field_key == e.field_key));
        if let Some(entry) = duplicate {
            return Err(RepositoryError::Conflict(format!(
                "duplicate field key {}",
                entry.field_key
            )));
        }

        Arc::make_mut(&mut snapshot.entries).extend_from_slice(entries);
        Ok(())
    }

    async fn delete_snapshot(
        &mut self,
        account: AccountId,
        id: SnapshotId,
    ) -> Result<bool, RepositoryError> {
        let owned = self
            .staged
            .snapshots
            .get(&id)
            .is_some_and(|s| s.account == account);
        if !owned {
            return Ok(false);
        }

        self.staged.snapshots.remove(&id);
        for record in self.staged.accounts.values_mut() {
            if record.draft == Some(id) {
                record.draft = None;
            }
        }
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { mut live, staged } = *self;
        *live = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    async fn store_with_snapshot() -> (MemoryRecordStore, AccountId, SnapshotId) {
        let store = MemoryRecordStore::new();
        let account = store
            .create_account(NewAccount {
                brand: "acme".to_owned(),
                role: "editor".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
            .id;
        let id = store
            .seed_snapshot(
                account,
                Utc::now(),
                vec![RowEntry::new("R1C1", "a"), RowEntry::new("R1C2", "b")],
                HighlightedRows::empty(),
            )
            .await
            .unwrap();
        (store, account, id)
    }

    #[tokio::test]
    async fn test_staged_entries_shared_until_written() {
        let (store, _, id) = store_with_snapshot().await;

        let tx = store.begin().await.unwrap();
        {
            let state = store.state.try_lock();
            assert!(state.is_err(), "transaction holds the store lock");
        }
        drop(tx);

        let live = Arc::clone(&store.state).lock_owned().await;
        let staged = live.clone();
        let shared = |state: &MemoryState| Arc::clone(&state.snapshots[&id].entries);
        assert!(Arc::ptr_eq(&shared(&*live), &shared(&staged)));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let (store, account, id) = store_with_snapshot().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_entries(id, &[RowEntry::new("R2C1", "c")])
            .await
            .unwrap();
        drop(tx);
        assert_eq!(store.entry_count().await, 2);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.delete_entries(id).await.unwrap(), 2);
        tx.insert_entries(id, &[RowEntry::new("R1C1", "z")])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let contents = store.snapshot(account, id).await.unwrap().unwrap();
        assert_eq!(contents.entries, vec![RowEntry::new("R1C1", "z")]);
    }
}
