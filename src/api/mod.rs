//! HTTP API for Syncmarks.
//!
//! Two operations form the sync core's boundary: uploading a chunk and
//! reading back a device's reconstructed tree. Both require the opaque
//! `x-auth-token` header. The root and `/health` routes are unauthenticated
//! probes.

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::app::App;

/// Builds the application router.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/bookmarks", post(handlers::sync_chunk))
        .route("/api/bookmarks/{device_ref}", get(handlers::list_tree))
        .with_state(app)
}
