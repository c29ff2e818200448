//! Draft and snapshot lifecycle over HTTP.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use sheetkeep_server::db::HistoryPolicy;
use sheetkeep_integration_tests::TestContext;

fn cell(key: &str, value: &str) -> Value {
    json!({ "field_key": key, "field_value": value })
}

fn first_year(body: &Value) -> i64 {
    body["years"][0].as_i64().expect("at least one year")
}

#[tokio::test]
async fn test_draft_promote_browse_flow() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    // First save opens a draft.
    let (status, first) = ctx
        .post(
            "/api/saveDraft",
            &token,
            json!({ "data": [cell("R1C1", "x")], "highlightRows": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["created"], true);
    let draft_id = first["snapshotId"].clone();

    // Second save replaces it in place.
    let (status, second) = ctx
        .post(
            "/api/saveDraft",
            &token,
            json!({ "data": [cell("R1C1", "y")], "highlightRows": [0] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["snapshotId"], draft_id);
    assert_eq!(second["created"], false);
    assert_eq!(second["createdAt"], first["createdAt"]);

    let (status, draft) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["snapshotId"], draft_id);
    assert_eq!(draft["data"], json!([cell("R1C1", "y")]));
    assert_eq!(draft["highlightRows"], json!([0]));
    assert_eq!(draft["grid"], json!([["y"]]));

    // Promotion finalizes under a fresh id and drops the draft.
    let (status, saved) = ctx
        .post(
            "/api/saveFiles",
            &token,
            json!({ "data": [cell("R1C1", "y")], "highlightRows": [0] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let final_id = saved["snapshotId"].clone();
    assert_ne!(final_id, draft_id);

    let (status, _) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .get(&format!("/api/getPBUData/{draft_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, years) = ctx.get("/api/getYears", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(years["years"].as_array().map(Vec::len), Some(1));
    let year = first_year(&years);

    let (status, files) = ctx.get(&format!("/api/getFiles/{year}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        files["files"],
        json!([{ "id": final_id, "createdAt": saved["createdAt"], "isDraft": false }])
    );

    let (status, data) = ctx
        .get(&format!("/api/getPBUData/{final_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["data"], json!([cell("R1C1", "y")]));
    assert_eq!(data["highlightRows"], json!([0]));
}

#[tokio::test]
async fn test_grid_payload_preserves_empty_cells() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;
    let grid = json!([["Name", "", "Qty"], ["", "", ""], ["widget", "blue", "3"]]);

    let (status, _) = ctx
        .post("/api/saveDraft", &token, json!({ "grid": grid, "highlightRows": null }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, draft) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["grid"], grid);
    assert_eq!(draft["data"].as_array().map(Vec::len), Some(9));
    assert_eq!(draft["data"][1], cell("R1C2", ""));
    assert_eq!(draft["highlightRows"], json!([]));
}

#[tokio::test]
async fn test_free_form_keys_have_no_grid() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let (status, _) = ctx
        .post(
            "/api/saveDraft",
            &token,
            json!({ "data": [cell("customer", "Initech"), cell("R1C1", "x")] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, draft) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(draft["grid"], Value::Null);
    assert_eq!(draft["data"][0], cell("customer", "Initech"));
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let cases = [
        json!({}),
        json!({ "data": [] }),
        json!({ "data": [cell("", "x")] }),
        json!({ "data": [cell("R1C1", "x"), cell("R1C1", "y")] }),
        json!({ "data": [cell("R1C1", "x")], "grid": [["x"]] }),
        json!({ "data": [cell("R1C1", "x")], "highlightRows": [-1] }),
        json!({ "data": "R1C1=x" }),
    ];

    for payload in cases {
        for uri in ["/api/saveDraft", "/api/saveFiles"] {
            let (status, body) = ctx.post(uri, &token, payload.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {payload}");
            assert!(body["error"].is_string());
        }
    }

    // Nothing was written.
    let (status, _) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, years) = ctx.get("/api/getYears", &token).await;
    assert_eq!(years, json!({ "years": [] }));
}

#[tokio::test]
async fn test_snapshots_are_private_to_their_account() {
    let ctx = TestContext::new();
    let owner = ctx.login_as("acme", "editor").await;
    let other = ctx.login_as("acme", "viewer").await;

    let (_, saved) = ctx
        .post("/api/saveFiles", &owner, json!({ "data": [cell("R1C1", "secret")] }))
        .await;
    let id = saved["snapshotId"].clone();

    let (status, _) = ctx.get(&format!("/api/getPBUData/{id}"), &owner).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get(&format!("/api/getPBUData/{id}"), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("data").is_none());

    let (_, years) = ctx.get("/api/getYears", &other).await;
    assert_eq!(years, json!({ "years": [] }));
    let (_, all) = ctx.get("/api/snapshots", &other).await;
    assert_eq!(all, json!({ "snapshots": [] }));
}

#[tokio::test]
async fn test_browse_errors() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let (status, _) = ctx.get("/api/getFiles/1999", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/getFiles/last-year", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.get("/api/getPBUData/abc", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.get("/api/getPBUData/424242", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_all_snapshots_newest_first() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let mut ids = Vec::new();
    for value in ["one", "two", "three"] {
        let (_, saved) = ctx
            .post("/api/saveFiles", &token, json!({ "data": [cell("R1C1", value)] }))
            .await;
        ids.push(saved["snapshotId"].clone());
    }
    let (_, draft) = ctx
        .post("/api/saveDraft", &token, json!({ "data": [cell("R1C1", "wip")] }))
        .await;
    ids.push(draft["snapshotId"].clone());
    ids.reverse();

    let (status, all) = ctx.get("/api/snapshots", &token).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Value> = all["snapshots"]
        .as_array()
        .expect("snapshots array")
        .iter()
        .map(|s| s["id"].clone())
        .collect();
    assert_eq!(listed, ids);
    assert_eq!(all["snapshots"][0]["isDraft"], true);
}

#[tokio::test]
async fn test_history_policy_can_hide_drafts() {
    let ctx = TestContext::with_policy(HistoryPolicy {
        include_drafts: false,
    });
    let token = ctx.login_as("acme", "editor").await;

    let (status, _) = ctx
        .post("/api/saveDraft", &token, json!({ "data": [cell("R1C1", "wip")] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, years) = ctx.get("/api/getYears", &token).await;
    assert_eq!(years, json!({ "years": [] }));

    // The draft itself is still reachable directly.
    let (status, _) = ctx.get("/api/getDraft", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_draft_saves_leave_one_draft() {
    let ctx = TestContext::new();
    let token = ctx.login_as("acme", "editor").await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = ctx.app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let body = json!({ "data": [cell("R1C1", &i.to_string())] });
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/saveDraft")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build");
            app.oneshot(request)
                .await
                .expect("router is infallible")
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("task should finish"), StatusCode::OK);
    }

    let (_, all) = ctx.get("/api/snapshots", &token).await;
    assert_eq!(all["snapshots"].as_array().map(Vec::len), Some(1));
    assert_eq!(all["snapshots"][0]["isDraft"], true);
    assert_eq!(ctx.store.entry_count().await, 1);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let ctx = TestContext::new();

    let (status, _) = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-1234")
        .body(Body::empty())
        .expect("request should build");
    let response = ctx
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(b"edge-1234".as_slice())
    );

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/saveDraft")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request should build");
    let response = ctx
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.as_bytes()),
        Some(b"http://localhost:3000".as_slice())
    );
}
