//! sheetkeep core - shared types library.
//!
//! This crate provides the types used across all sheetkeep components:
//! - `server` - HTTP API and persistence for drafts and snapshots
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure transformations - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, row entries, highlight sets and snapshot summaries
//! - [`codec`] - Conversion between tabular grids and flat row entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod types;

pub use codec::{CellKey, CodecError, Grid, RowCodec};
pub use types::*;
