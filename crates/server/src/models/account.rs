//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sheetkeep_core::AccountId;

/// An organizational account, identified for login by its brand and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Brand the account belongs to.
    pub brand: String,
    /// Role within the brand.
    pub role: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register an account.
///
/// The password is already hashed by the time this reaches storage.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub brand: String,
    pub role: String,
    pub password_hash: String,
}
