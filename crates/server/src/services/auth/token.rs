//! HS256 bearer tokens in JWT compact form.
//!
//! `base64url(header) . base64url(claims) . base64url(hmac_sha256(secret, header.claims))`

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use sheetkeep_core::{AccountId, AuthenticatedAccount};

use super::{AuthError, Authenticator};
use crate::models::account::Account;

type HmacSha256 = Hmac<Sha256>;

/// Fixed header; tokens carrying anything else are rejected.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: AccountId,
    brand: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies tokens signed with a shared secret.
pub struct TokenAuthenticator {
    secret: SecretString,
    ttl: Duration,
}

impl TokenAuthenticator {
    /// Create an authenticator with the given signing secret and token lifetime.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::Signing)
    }

    /// Issue a token as of `now`.
    pub(crate) fn issue_at(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            id: account.id,
            brand: account.brand.clone(),
            role: account.role.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let claims = serde_json::to_vec(&claims).map_err(|_| AuthError::Signing)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token as of `now`.
    pub(crate) fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedAccount, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let header = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| AuthError::InvalidToken)?;
        if header != HEADER.as_bytes() {
            return Err(AuthError::InvalidToken);
        }

        let claims = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::InvalidToken);
        }

        Ok(AuthenticatedAccount {
            account_id: claims.id,
            brand: claims.brand,
            role: claims.role,
        })
    }
}

impl Authenticator for TokenAuthenticator {
    fn issue(&self, account: &Account) -> Result<String, AuthError> {
        self.issue_at(account, Utc::now())
    }

    fn authenticate(&self, token: &str) -> Result<AuthenticatedAccount, AuthError> {
        self.verify_at(token, Utc::now())
    }
}
