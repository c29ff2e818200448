//! Registration and login.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::account::Account;
use crate::state::AppState;

/// Credentials for both registration and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub account: Account,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(creds) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let account = state
        .accounts()
        .register(&creds.brand, &creds.role, &creds.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account registered successfully",
            account,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(creds) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let token = state
        .accounts()
        .login(&creds.brand, &creds.role, &creds.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}
