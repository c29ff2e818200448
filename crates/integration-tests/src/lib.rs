//! End-to-end tests for the sheetkeep HTTP API.
//!
//! Tests drive the real router through `tower::ServiceExt::oneshot`, backed by
//! the in-memory record store, so no database or socket is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sheetkeep-integration-tests
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use sheetkeep_server::config::ServerConfig;
use sheetkeep_server::db::{HistoryPolicy, MemoryRecordStore};
use sheetkeep_server::services::TokenAuthenticator;
use sheetkeep_server::state::AppState;

/// Signing key used by every test server.
pub const TEST_TOKEN_SECRET: &str = "Zq7!uR2@kW9#pL4$xN6%bT1^mC8&vH3*";

/// Password used by [`TestContext::login_as`].
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Response status and parsed JSON body (`Value::Null` for non-JSON bodies).
pub type TestResponse = (StatusCode, Value);

/// A router over a fresh in-memory store.
pub struct TestContext {
    pub app: Router,
    pub store: MemoryRecordStore,
}

impl TestContext {
    /// Server with the default history policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(HistoryPolicy::default())
    }

    /// Server with an explicit history policy.
    #[must_use]
    pub fn with_policy(history_policy: HistoryPolicy) -> Self {
        let config = test_config(history_policy);
        let store = MemoryRecordStore::new();
        let authenticator = TokenAuthenticator::new(config.token_secret.clone(), config.token_ttl);
        let state = AppState::new(config, Arc::new(store.clone()), Arc::new(authenticator));

        Self {
            app: sheetkeep_server::app(state),
            store,
        }
    }

    /// Send a request, optionally with a bearer token and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request should build");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// GET with a bearer token.
    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// POST JSON with a bearer token.
    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Register `brand`/`role` with [`TEST_PASSWORD`] and return a token.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn login_as(&self, brand: &str, role: &str) -> String {
        let creds = serde_json::json!({
            "brand": brand,
            "role": role,
            "password": TEST_PASSWORD,
        });

        let (status, body) = self
            .send(Method::POST, "/register", None, Some(creds.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let (status, body) = self.send(Method::POST, "/login", None, Some(creds)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body.get("token")
            .and_then(Value::as_str)
            .expect("login returns a token")
            .to_string()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for an in-process test server.
#[must_use]
pub fn test_config(history_policy: HistoryPolicy) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        token_secret: SecretString::from(TEST_TOKEN_SECRET),
        token_ttl: Duration::hours(1),
        cors_origins: vec!["http://localhost:3000".to_string()],
        history_policy,
        sentry_dsn: None,
        sentry_environment: None,
    }
}
