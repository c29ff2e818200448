//! Business logic services.
//!
//! # Services
//!
//! - `drafts` - One mutable draft per account, and promotion to finalized snapshots
//! - `snapshots` - Read-side browsing of snapshot history
//! - `auth` - Account registration, login and bearer token verification

pub mod auth;
pub mod drafts;
pub mod error;
pub mod snapshots;

pub use drafts::{DraftManager, DraftSaved};
pub use error::SheetError;
pub use auth::{
    AccountService, AuthError, Authenticator, TokenAuthenticator, register_account,
};
pub use snapshots::SnapshotQuery;
