//! Browsing finalized snapshots.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde::Serialize;

use sheetkeep_core::{SnapshotId, SnapshotSummary};

use super::drafts::SheetDataResponse;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct YearsResponse {
    pub years: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<SnapshotSummary>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotsResponse {
    pub snapshots: Vec<SnapshotSummary>,
}

/// GET /api/getYears
pub async fn years(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<YearsResponse>> {
    let years = state.snapshots().list_years(caller.account_id).await?;
    Ok(Json(YearsResponse { years }))
}

/// GET /api/getFiles/{year}
pub async fn files(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    year: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<FilesResponse>> {
    let Path(year) = year.map_err(|_| AppError::BadRequest("year must be an integer".into()))?;
    let files = state
        .snapshots()
        .list_snapshots(caller.account_id, year)
        .await?;
    Ok(Json(FilesResponse { files }))
}

/// GET /api/getPBUData/{snapshot_id}
pub async fn snapshot_data(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    id: std::result::Result<Path<SnapshotId>, PathRejection>,
) -> Result<Json<SheetDataResponse>> {
    let Path(id) =
        id.map_err(|_| AppError::BadRequest("snapshot id must be an integer".into()))?;
    let contents = state
        .snapshots()
        .get_snapshot(caller.account_id, id)
        .await?;
    Ok(Json(contents.into()))
}

/// GET /api/snapshots
pub async fn all(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<SnapshotsResponse>> {
    let snapshots = state.snapshots().list_all(caller.account_id).await?;
    Ok(Json(SnapshotsResponse { snapshots }))
}
