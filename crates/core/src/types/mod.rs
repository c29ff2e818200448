//! Core types for sheetkeep.
//!
//! This module provides type-safe wrappers for the persistence model.

pub mod id;
pub mod row;
pub mod snapshot;

pub use id::*;
pub use row::{HighlightedRows, RowEntry};
pub use snapshot::{AuthenticatedAccount, SnapshotContents, SnapshotSummary};
