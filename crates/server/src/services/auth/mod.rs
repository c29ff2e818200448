//! Authentication service.
//!
//! Accounts are identified by their `(brand, role)` pair and log in with a
//! password. A successful login yields a signed bearer token.

mod error;
mod token;

pub use error::AuthError;
pub use token::TokenAuthenticator;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use sheetkeep_core::{AccountId, AuthenticatedAccount};

use crate::db::{RecordStore, RepositoryError};
use crate::models::account::{Account, NewAccount};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Turns bearer tokens into authenticated accounts and back.
pub trait Authenticator: Send + Sync {
    /// Issue a token for the account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be produced.
    fn issue(&self, account: &Account) -> Result<String, AuthError>;

    /// Verify a token and return the account it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed, tampered or expired tokens.
    fn authenticate(&self, token: &str) -> Result<AuthenticatedAccount, AuthError>;
}

/// Registration, login and account lookup.
pub struct AccountService<'a> {
    store: &'a dyn RecordStore,
    authenticator: &'a dyn Authenticator,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, authenticator: &'a dyn Authenticator) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// See [`register_account`].
    pub async fn register(
        &self,
        brand: &str,
        role: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        register_account(self.store, brand, role, password).await
    }

    /// Log in with brand, role and password, returning a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the account is unknown or
    /// the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        brand: &str,
        role: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let (account, hash) = self
            .store
            .account_by_login(brand.trim(), role.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        self.authenticator.issue(&account)
    }

    /// Current details of an authenticated account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account was removed after
    /// its token was issued.
    pub async fn details(&self, id: AccountId) -> Result<Account, AuthError> {
        self.store
            .account(id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }
}

/// Register a new account directly against a store.
///
/// Brand and role are trimmed before storage.
///
/// # Errors
///
/// Returns `AuthError::MissingField` if brand or role is blank.
/// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
/// Returns `AuthError::AccountExists` if the brand and role are already registered.
#[instrument(skip(store, password))]
pub async fn register_account(
    store: &dyn RecordStore,
    brand: &str,
    role: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let brand = required("brand", brand)?;
    let role = required("role", role)?;
    validate_password(password)?;

    let password_hash = hash_password(password)?;

    let account = store
        .create_account(NewAccount {
            brand: brand.to_owned(),
            role: role.to_owned(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::AccountExists,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(account_id = %account.id, "account registered");
    Ok(account)
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
