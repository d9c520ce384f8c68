//! Bookmark Store for Syncmarks.
//!
//! Durable keyed storage for flat bookmark rows, scoped to one
//! (user, device) pair per row, backed by SQLite via `rusqlite`.
//!
//! Methods return `rusqlite::Error` directly so the sync coordinator can
//! classify lock contention inside its transaction; callers outside a
//! transaction wrap errors into their own types.

use rusqlite::{params, Connection};

use crate::types::bookmark::{BookmarkPayload, BookmarkRecord};

/// Trait defining bookmark storage operations.
///
/// Device scoping is enforced here in SQL — there is no cross-device query.
pub trait BookmarkStoreTrait {
    /// Deletes every bookmark row owned by the given device. Returns the
    /// number of rows removed.
    fn delete_all_for_device(&self, device_id: i64) -> Result<usize, rusqlite::Error>;

    /// Upserts every record in the slice for the given (user, device) scope.
    ///
    /// Conflicts on the natural key (id, user_id, device_id) update
    /// parent_id, title, url, date_added and is_folder in place; the
    /// client-assigned `id` is never regenerated. All-or-nothing only when
    /// run inside the caller's transaction.
    fn upsert_many(
        &self,
        user_id: i64,
        device_id: i64,
        records: &[BookmarkPayload],
    ) -> Result<usize, rusqlite::Error>;

    /// Fetches all rows for a device as an unordered flat collection.
    ///
    /// When `search` is a non-empty term, applies a case-insensitive
    /// substring match against title OR url before returning; an empty or
    /// absent term matches everything (folders have no url but always have
    /// a title, so they match the empty term too).
    fn find_all_for_device(
        &self,
        device_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<BookmarkRecord>, rusqlite::Error>;

    /// Counts the rows currently stored for a device.
    fn count_for_device(&self, device_id: i64) -> Result<i64, rusqlite::Error>;
}

/// Bookmark store backed by a SQLite connection.
pub struct BookmarkStore<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkStore<'a> {
    /// Creates a new `BookmarkStore` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reads a single bookmark row into a struct.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<BookmarkRecord> {
        Ok(BookmarkRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            device_id: row.get(2)?,
            parent_id: row.get(3)?,
            title: row.get(4)?,
            url: row.get(5)?,
            date_added: row.get(6)?,
            is_folder: row.get(7)?,
        })
    }
}

impl<'a> BookmarkStoreTrait for BookmarkStore<'a> {
    fn delete_all_for_device(&self, device_id: i64) -> Result<usize, rusqlite::Error> {
        self.conn.execute(
            "DELETE FROM bookmarks WHERE device_id = ?1",
            params![device_id],
        )
    }

    fn upsert_many(
        &self,
        user_id: i64,
        device_id: i64,
        records: &[BookmarkPayload],
    ) -> Result<usize, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO bookmarks (id, user_id, device_id, parent_id, title, url, date_added, is_folder) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id, user_id, device_id) DO UPDATE SET \
                 parent_id = excluded.parent_id, \
                 title = excluded.title, \
                 url = excluded.url, \
                 date_added = excluded.date_added, \
                 is_folder = excluded.is_folder",
        )?;

        for record in records {
            stmt.execute(params![
                record.id,
                user_id,
                device_id,
                record.parent_id,
                record.title,
                record.url,
                record.date_added,
                record.is_folder,
            ])?;
        }
        Ok(records.len())
    }

    fn find_all_for_device(
        &self,
        device_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<BookmarkRecord>, rusqlite::Error> {
        // LIKE with an empty pattern still matches every row: title is NOT
        // NULL, so the title arm of the OR is always true for '%%'.
        let pattern = format!("%{}%", search.unwrap_or(""));
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, device_id, parent_id, title, url, date_added, is_folder \
             FROM bookmarks WHERE device_id = ?1 AND (title LIKE ?2 OR url LIKE ?2)",
        )?;

        let rows = stmt.query_map(params![device_id, pattern], Self::row_to_record)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn count_for_device(&self, device_id: i64) -> Result<i64, rusqlite::Error> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE device_id = ?1",
            params![device_id],
            |row| row.get(0),
        )
    }
}
