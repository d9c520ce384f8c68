//! End-to-end tests for the HTTP API, driving the axum router in-process.
//!
//! The router is exercised with `tower::ServiceExt::oneshot` against an
//! in-memory database, covering authentication, the sync/read round trip
//! and the error-to-status mapping.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use syncmarks::api;
use syncmarks::app::App;
use syncmarks::managers::device_registry::{DeviceRegistry, DeviceRegistryTrait};
use syncmarks::managers::sync_coordinator::RetryPolicy;
use syncmarks::services::auth_service::{AuthService, AuthServiceTrait};

const SECRET: &[u8] = b"api-test-secret";

/// Helper: router over an in-memory App with one device ("dev-1", user 1),
/// plus a fresh token for user 1.
fn setup() -> (Router, String) {
    let app = App::open_in_memory(
        SECRET,
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(5),
        },
    )
    .expect("Failed to initialize app");
    {
        let guard = app.db.lock().unwrap();
        DeviceRegistry::new(guard.connection())
            .register(1, "Laptop", Some("dev-1"))
            .expect("register failed");
    }
    let token = app.auth.issue(1, 3600);
    (api::router(Arc::new(app)), token)
}

async fn post_json(router: &Router, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/bookmarks")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(router, request).await
}

async fn get(router: &Router, token: Option<&str>, uri: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    let request = builder.body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn reference_chunk() -> Value {
    json!({
        "deviceId": "dev-1",
        "bookmarks": [
            {"id": "1", "parentId": null, "title": "Work", "dateAdded": 1700000000000i64, "isFolder": true},
            {"id": "2", "parentId": "1", "title": "Docs", "url": "https://x", "dateAdded": 1700000000001i64, "isFolder": false}
        ],
        "chunkIndex": 0,
        "totalChunks": 1
    })
}

#[tokio::test]
async fn test_probes_require_no_auth() {
    let (router, _) = setup();

    let (status, body) = get(&router, None, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Syncmarks API");

    let (status, body) = get(&router, None, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (router, _) = setup();

    let (status, body) = post_json(&router, None, reference_chunk()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "No token, authorization denied");

    let (status, _) = get(&router, None, "/api/bookmarks/dev-1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_flagged() {
    let (router, _) = setup();
    let expired = AuthService::new(SECRET).issue(1, -10);

    let (status, body) = get(&router, Some(&expired), "/api/bookmarks/dev-1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token has expired");
    assert_eq!(body["expired"], true);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let (router, _) = setup();

    let (status, body) = get(&router, Some("nonsense"), "/api/bookmarks/dev-1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token is not valid");
}

#[tokio::test]
async fn test_sync_then_read_round_trip() {
    let (router, token) = setup();

    let (status, body) = post_json(&router, Some(&token), reference_chunk()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chunk 1/1 synced successfully");
    assert_eq!(body["count"], 2);
    assert_eq!(body["totalCount"], 2);

    let (status, body) = get(&router, Some(&token), "/api/bookmarks/dev-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalBookmarks"], 2);

    let roots = body["bookmarks"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], "1");
    assert_eq!(roots[0]["title"], "Work");
    assert_eq!(roots[0]["isFolder"], true);
    let children = roots[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], "2");
    assert_eq!(children[0]["title"], "Docs");
    assert_eq!(children[0]["url"], "https://x");
    assert_eq!(children[0]["children"].as_array().unwrap().len(), 0);
}

/// The reference search behavior: "doc" matches only the leaf, whose parent
/// folder is filtered out before tree assembly, so the count is 1 and the
/// visible tree is empty.
#[tokio::test]
async fn test_search_counts_filtered_rows_not_tree_nodes() {
    let (router, token) = setup();
    post_json(&router, Some(&token), reference_chunk()).await;

    let (status, body) = get(&router, Some(&token), "/api/bookmarks/dev-1?search=doc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalBookmarks"], 1);
    assert_eq!(body["bookmarks"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let (router, token) = setup();

    let mut chunk = reference_chunk();
    chunk["deviceId"] = json!("no-such-device");
    let (status, body) = post_json(&router, Some(&token), chunk).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Device not found");

    let (status, body) = get(&router, Some(&token), "/api/bookmarks/no-such-device").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Device not found");
}

#[tokio::test]
async fn test_other_users_device_is_not_found() {
    let (router, _) = setup();
    let intruder = AuthService::new(SECRET).issue(2, 3600);

    let (status, _) = get(&router, Some(&intruder), "/api/bookmarks/dev-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_chunk_is_bad_request() {
    let (router, token) = setup();

    let mut chunk = reference_chunk();
    chunk["chunkIndex"] = json!(1);
    chunk["totalChunks"] = json!(1);
    let (status, body) = post_json(&router, Some(&token), chunk).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Invalid sync chunk");
}
