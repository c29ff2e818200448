//! Registration, login and token handling over HTTP.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use sheetkeep_integration_tests::{TEST_PASSWORD, TestContext};

fn creds(brand: &str, role: &str, password: &str) -> Value {
    json!({ "brand": brand, "role": role, "password": password })
}

#[tokio::test]
async fn test_register_returns_created_account() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/register",
            None,
            Some(creds("acme", "editor", TEST_PASSWORD)),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["brand"], "acme");
    assert_eq!(body["account"]["role"], "editor");
    assert!(body["account"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    ctx.login_as("acme", "editor").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/register",
            None,
            Some(creds("acme", "editor", "another password")),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_registration_validation() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .send(Method::POST, "/register", None, Some(creds("acme", "editor", "short")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(Method::POST, "/register", None, Some(creds("", "editor", TEST_PASSWORD)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(Method::POST, "/register", None, Some(json!("not an object")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new();
    ctx.login_as("acme", "editor").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/login",
            None,
            Some(creds("acme", "editor", "wrong password")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/login",
            None,
            Some(creds("acme", "viewer", TEST_PASSWORD)),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new();

    for uri in ["/api/getDraft", "/api/getYears", "/api/getUserDetails"] {
        let (status, body) = ctx.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_empty_bearer_is_unauthorized() {
    let ctx = TestContext::new();

    // Sends `Authorization: Bearer ` with nothing after the scheme.
    let (status, body) = ctx.send(Method::GET, "/api/getDraft", Some(""), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    for value in ["Bearer", "bearer   "] {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/getYears")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .expect("request should build");
        let response = ctx
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value:?}");
    }
}

#[tokio::test]
async fn test_invalid_token_is_forbidden() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let (status, _) = ctx.get("/api/getYears", "not-a-token").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut tampered = token;
    tampered.push('A');
    let (status, _) = ctx.get("/api/getYears", &tampered).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_accepted_without_bearer_prefix() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/getUserDetails")
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())
        .expect("request should build");
    let response = ctx
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_details() {
    let ctx = TestContext::new();
    let token = ctx.login_as("globex", "viewer").await;

    let (status, body) = ctx.get("/api/getUserDetails", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "brand": "globex", "role": "viewer" }));
}
