//! App Core for Syncmarks.
//!
//! Central struct wiring the database, the chunk ingestion coordinator and
//! the token verifier together for the HTTP layer.

use std::sync::Mutex;

use crate::database::Database;
use crate::managers::sync_coordinator::{RetryPolicy, SyncCoordinator};
use crate::services::auth_service::AuthService;

/// Central application struct shared across request handlers.
///
/// The database sits behind a `Mutex` because `rusqlite::Connection` is not
/// `Sync`; the coordinator takes the lock per transaction attempt and
/// releases it across its backoff sleeps. `BookmarkStore`, `DeviceRegistry`
/// and `QueryService` are created on demand from `db` because they borrow
/// the connection with a lifetime parameter.
pub struct App {
    pub db: Mutex<Database>,
    pub coordinator: SyncCoordinator,
    pub auth: AuthService,
}

impl App {
    /// Creates a new App backed by an on-disk database.
    pub fn new(
        db_path: &str,
        auth_secret: &[u8],
        retry: RetryPolicy,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open(db_path)?;
        Ok(Self {
            db: Mutex::new(db),
            coordinator: SyncCoordinator::new(retry),
            auth: AuthService::new(auth_secret),
        })
    }

    /// Creates a new App backed by an in-memory database.
    ///
    /// Used by tests; state is discarded when the App is dropped.
    pub fn open_in_memory(
        auth_secret: &[u8],
        retry: RetryPolicy,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Mutex::new(db),
            coordinator: SyncCoordinator::new(retry),
            auth: AuthService::new(auth_secret),
        })
    }
}
