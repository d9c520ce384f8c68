//! Query/Search Service for Syncmarks.
//!
//! Resolves a device reference, fetches the device's flat rows with an
//! optional substring filter, and hands them to the tree builder.
//!
//! Filtering happens on the flat set BEFORE tree assembly: a folder whose
//! own title/url does not match the term is excluded even when its
//! children match, so those children drop out of the visible tree while
//! still counting toward `total_bookmarks`.

use rusqlite::Connection;

use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use crate::managers::device_registry::{DeviceRegistry, DeviceRegistryTrait};
use crate::services::tree_builder::build_tree;
use crate::types::errors::{DeviceError, QueryError};
use crate::types::sync::TreeListing;

/// Trait defining the tree listing operation.
pub trait QueryServiceTrait {
    /// Returns the reconstructed tree and the filtered flat count for one
    /// of the user's devices. `device_ref` may be the internal id or the
    /// client device identifier.
    fn list_tree(
        &self,
        user_id: i64,
        device_ref: &str,
        search: Option<&str>,
    ) -> Result<TreeListing, QueryError>;
}

/// Query service backed by a SQLite connection.
pub struct QueryService<'a> {
    conn: &'a Connection,
}

impl<'a> QueryService<'a> {
    /// Creates a new `QueryService` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> QueryServiceTrait for QueryService<'a> {
    fn list_tree(
        &self,
        user_id: i64,
        device_ref: &str,
        search: Option<&str>,
    ) -> Result<TreeListing, QueryError> {
        let registry = DeviceRegistry::new(self.conn);
        let device = registry.resolve(user_id, device_ref).map_err(|err| match err {
            DeviceError::NotFound(device_ref) => QueryError::DeviceNotFound(device_ref),
            other => QueryError::Database(other.to_string()),
        })?;

        let store = BookmarkStore::new(self.conn);
        let records = store
            .find_all_for_device(device.id, search)
            .map_err(|err| QueryError::Database(err.to_string()))?;

        let bookmarks = build_tree(&records)?;
        Ok(TreeListing {
            bookmarks,
            total_bookmarks: records.len(),
        })
    }
}
