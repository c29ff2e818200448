//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! POST /register                  - Register a brand/role account
//! POST /login                     - Exchange credentials for a bearer token
//!
//! # Authenticated (Authorization: [Bearer] <token>)
//! GET  /api/getUserDetails        - Brand and role of the caller
//! POST /api/saveDraft             - Create or replace the caller's draft
//! POST /api/saveFiles             - Finalize rows as a snapshot, dropping the draft
//! GET  /api/getDraft              - Current draft contents
//! GET  /api/getYears              - Years that have snapshots
//! GET  /api/getFiles/{year}       - Snapshots created in a year
//! GET  /api/getPBUData/{id}       - Contents of one snapshot
//! GET  /api/snapshots             - Every snapshot, newest first
//! ```

pub mod account;
pub mod auth;
pub mod drafts;
pub mod snapshots;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the account routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the authenticated API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/getUserDetails", get(account::user_details))
        .route("/saveDraft", post(drafts::save_draft))
        .route("/saveFiles", post(drafts::save_files))
        .route("/getDraft", get(drafts::get_draft))
        .route("/getYears", get(snapshots::years))
        .route("/getFiles/{year}", get(snapshots::files))
        .route("/getPBUData/{snapshot_id}", get(snapshots::snapshot_data))
        .route("/snapshots", get(snapshots::all))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .nest("/api", api_routes())
}
