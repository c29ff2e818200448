//! Snapshot and account views shared between the server and its clients.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, HighlightedRows, RowEntry, SnapshotId};

/// Identity header of a snapshot, as listed when browsing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub created_at: DateTime<Utc>,
    /// True when this snapshot is the account's live draft.
    pub is_draft: bool,
}

impl SnapshotSummary {
    /// Calendar year (UTC) the snapshot was created in.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.created_at.year()
    }
}

/// Full contents of a snapshot: ordered entries plus its highlight set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotContents {
    pub id: SnapshotId,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<RowEntry>,
    pub highlighted_rows: HighlightedRows,
}

/// The identity the authenticator vouches for.
///
/// Everything downstream trusts `account_id` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
    pub brand: String,
    pub role: String,
}
