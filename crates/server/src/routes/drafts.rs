//! Draft save, fetch and promotion.
//!
//! Both save endpoints accept either `data` (a list of `field_key` /
//! `field_value` entries) or `grid` (a 2-D array of cell strings) plus an
//! optional `highlightRows` list.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sheetkeep_core::{
    CodecError, Grid, HighlightedRows, RowCodec, RowEntry, SnapshotContents, SnapshotId,
};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::SheetError;
use crate::state::AppState;

/// Body of `saveDraft` and `saveFiles`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default)]
    pub data: Option<Vec<RowEntry>>,
    #[serde(default)]
    pub grid: Option<Grid>,
    #[serde(default)]
    pub highlight_rows: Option<HighlightedRows>,
}

impl SavePayload {
    /// Resolve the payload into row entries and highlights.
    ///
    /// # Errors
    ///
    /// Returns `SheetError::InvalidInput` if both `data` and `grid` are given,
    /// and `SheetError::InvalidRows` if neither is or the grid is too large.
    pub fn into_rows(self) -> std::result::Result<(Vec<RowEntry>, HighlightedRows), SheetError> {
        let rows = match (self.data, self.grid) {
            (Some(_), Some(_)) => {
                return Err(SheetError::InvalidInput(
                    "provide either data or grid, not both".to_string(),
                ));
            }
            (Some(data), None) => data,
            (None, Some(grid)) => RowCodec::encode(&grid)?,
            (None, None) => return Err(CodecError::Empty.into()),
        };
        Ok((rows, self.highlight_rows.unwrap_or_default()))
    }
}

/// Response to a successful save.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub message: &'static str,
    pub snapshot_id: SnapshotId,
    pub created_at: DateTime<Utc>,
    /// Whether a draft save opened a new draft. Absent for promotions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

/// Contents of a draft or snapshot.
///
/// `grid` is present only when every key is a positional `R{row}C{col}` key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDataResponse {
    pub snapshot_id: SnapshotId,
    pub created_at: DateTime<Utc>,
    pub data: Vec<RowEntry>,
    pub highlight_rows: HighlightedRows,
    pub grid: Option<Grid>,
}

impl From<SnapshotContents> for SheetDataResponse {
    fn from(contents: SnapshotContents) -> Self {
        let grid = RowCodec::decode(&contents.entries).ok();
        Self {
            snapshot_id: contents.id,
            created_at: contents.created_at,
            data: contents.entries,
            highlight_rows: contents.highlighted_rows,
            grid,
        }
    }
}

fn payload_rows(
    payload: std::result::Result<Json<SavePayload>, JsonRejection>,
) -> Result<(Vec<RowEntry>, HighlightedRows)> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(payload.into_rows()?)
}

/// POST /api/saveDraft
pub async fn save_draft(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    payload: std::result::Result<Json<SavePayload>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let (rows, highlights) = payload_rows(payload)?;

    let saved = state
        .drafts()
        .save_draft(caller.account_id, &rows, &highlights)
        .await?;

    Ok(Json(SaveResponse {
        success: true,
        message: "Draft saved successfully",
        snapshot_id: saved.snapshot_id,
        created_at: saved.created_at,
        created: Some(saved.created),
    }))
}

/// POST /api/saveFiles
pub async fn save_files(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    payload: std::result::Result<Json<SavePayload>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let (rows, highlights) = payload_rows(payload)?;

    let snapshot = state
        .drafts()
        .promote_draft(caller.account_id, &rows, &highlights)
        .await?;

    Ok(Json(SaveResponse {
        success: true,
        message: "File saved successfully",
        snapshot_id: snapshot.id,
        created_at: snapshot.created_at,
        created: None,
    }))
}

/// GET /api/getDraft
pub async fn get_draft(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<SheetDataResponse>> {
    let draft = state.drafts().get_draft(caller.account_id).await?;
    Ok(Json(draft.into()))
}
