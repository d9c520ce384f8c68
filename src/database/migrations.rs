//! Schema migrations for the Syncmarks SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Migrations are versioned — each runs exactly once and is recorded in
/// the `schema_version` table. Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Enable WAL and foreign keys (always, not versioned)
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: devices and bookmarks")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: devices and bookmarks.
///
/// Bookmark identity is the client-assigned `id` scoped to one (user, device)
/// pair — the same `id` string may appear for different devices, so the row id
/// stays SQLite's implicit rowid and the natural key is a unique index.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS devices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            device_id TEXT NOT NULL,
            name TEXT NOT NULL,
            bookmark_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(user_id, device_id)
        );

        CREATE TABLE IF NOT EXISTS bookmarks (
            id TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            device_id INTEGER NOT NULL,
            parent_id TEXT,
            title TEXT NOT NULL,
            url TEXT,
            date_added INTEGER NOT NULL,
            is_folder INTEGER NOT NULL DEFAULT 0,
            UNIQUE(id, user_id, device_id),
            FOREIGN KEY (device_id) REFERENCES devices(id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookmarks_device ON bookmarks(device_id);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_device_parent ON bookmarks(device_id, parent_id);
        CREATE INDEX IF NOT EXISTS idx_devices_user ON devices(user_id);
        ",
    )
}
