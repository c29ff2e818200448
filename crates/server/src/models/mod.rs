//! Domain models owned by the server.
//!
//! Sheet data types (`RowEntry`, `SnapshotSummary`, ...) live in
//! `sheetkeep-core`; this module only holds the account records that never
//! leave the server.

pub mod account;

pub use account::{Account, NewAccount};
