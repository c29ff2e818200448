//! Bearer token extractor.
//!
//! Handlers that take [`RequireAuth`] only run for requests carrying a valid
//! token in the `Authorization` header, either bare or with a `Bearer ` prefix.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use sheetkeep_core::AuthenticatedAccount;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(account): RequireAuth) -> String {
///     format!("Hello, {}!", account.brand)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedAccount);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let account = state.authenticator().authenticate(token)?;

        Span::current().record("account_id", account.account_id.as_i32());
        set_sentry_user(&account.account_id, &account.brand, &account.role);

        Ok(Self(account))
    }
}

/// Token from the `Authorization` header, with any `Bearer ` prefix removed.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}
