//! Request handlers for the Syncmarks HTTP API.
//!
//! Handlers authenticate the request, run the store work on the blocking
//! thread pool, and map domain errors onto HTTP statuses. Internal failure
//! detail is logged, never leaked to read clients.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::app::App;
use crate::managers::sync_coordinator::SyncCoordinatorTrait;
use crate::services::auth_service::AuthServiceTrait;
use crate::services::query_service::{QueryService, QueryServiceTrait};
use crate::types::errors::{AuthError, QueryError, SyncError};
use crate::types::sync::SyncChunkRequest;

/// Query string for the tree listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// Welcome route.
pub async fn index() -> impl IntoResponse {
    Json(json!({"message": "Welcome to the Syncmarks API"}))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// `POST /api/bookmarks` — ingest one sync chunk.
pub async fn sync_chunk(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(request): Json<SyncChunkRequest>,
) -> Response {
    let user_id = match authenticate(&app, &headers) {
        Ok(user_id) => user_id,
        Err(denied) => return denied,
    };

    let chunk_label = format!("{}/{}", request.chunk_index + 1, request.total_chunks);
    let worker = Arc::clone(&app);
    let result =
        tokio::task::spawn_blocking(move || worker.coordinator.sync_chunk(&worker.db, user_id, &request))
            .await;

    match result {
        Ok(Ok(receipt)) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("Chunk {} synced successfully", chunk_label),
                "count": receipt.synced_count,
                "totalCount": receipt.total_count,
            })),
        )
            .into_response(),
        Ok(Err(err)) => sync_error_response(err),
        Err(join_err) => {
            error!("sync worker failed: {}", join_err);
            server_error()
        }
    }
}

/// `GET /api/bookmarks/{device_ref}?search=` — reconstructed tree for one device.
pub async fn list_tree(
    State(app): State<Arc<App>>,
    Path(device_ref): Path<String>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authenticate(&app, &headers) {
        Ok(user_id) => user_id,
        Err(denied) => return denied,
    };

    let worker = Arc::clone(&app);
    let result = tokio::task::spawn_blocking(move || {
        let guard = worker
            .db
            .lock()
            .map_err(|_| QueryError::Database("database mutex poisoned".into()))?;
        QueryService::new(guard.connection()).list_tree(user_id, &device_ref, params.search.as_deref())
    })
    .await;

    match result {
        Ok(Ok(listing)) => (StatusCode::OK, Json(listing)).into_response(),
        Ok(Err(QueryError::DeviceNotFound(_))) => device_not_found(),
        Ok(Err(err)) => {
            error!("tree listing failed: {}", err);
            server_error()
        }
        Err(join_err) => {
            error!("query worker failed: {}", join_err);
            server_error()
        }
    }
}

/// Resolves the `x-auth-token` header to a user id, or produces the 401.
fn authenticate(app: &App, headers: &HeaderMap) -> Result<i64, Response> {
    let token = headers.get("x-auth-token").and_then(|value| value.to_str().ok());
    app.auth.verify(token).map_err(|err| {
        let body = match err {
            AuthError::Expired => json!({"msg": "Token has expired", "expired": true}),
            AuthError::MissingToken => json!({"msg": "No token, authorization denied"}),
            AuthError::InvalidToken => json!({"msg": "Token is not valid"}),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    })
}

fn sync_error_response(err: SyncError) -> Response {
    match err {
        SyncError::DeviceNotFound(_) => device_not_found(),
        SyncError::InvalidChunk(reason) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"msg": "Invalid sync chunk", "error": reason})),
        )
            .into_response(),
        SyncError::RetriesExhausted(attempts) => {
            error!("bookmark sync gave up after {} attempts", attempts);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"msg": "Server error: Max retries reached"})),
            )
                .into_response()
        }
        other => {
            error!("bookmark sync failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"msg": "Server error", "error": other.to_string()})),
            )
                .into_response()
        }
    }
}

fn device_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"msg": "Device not found"})),
    )
        .into_response()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"msg": "Server error"})),
    )
        .into_response()
}
