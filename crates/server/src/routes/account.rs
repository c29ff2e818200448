//! Details of the authenticated account.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub brand: String,
    pub role: String,
}

/// GET /api/getUserDetails
///
/// Reads the stored account rather than trusting the token claims, so an
/// account removed after login reports 404.
pub async fn user_details(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<UserDetails>> {
    let account = state.accounts().details(caller.account_id).await?;

    Ok(Json(UserDetails {
        brand: account.brand,
        role: account.role,
    }))
}
