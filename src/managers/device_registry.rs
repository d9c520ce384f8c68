//! Device Registry for Syncmarks.
//!
//! Owns the `devices` table: registration, resolution and removal of sync
//! devices, always scoped to the owning user. The `bookmark_count` column
//! is read here but written by the sync coordinator during ingestion.

use rusqlite::{params, Connection, OptionalExtension};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::types::device::Device;
use crate::types::errors::DeviceError;

/// Trait defining device registry operations.
pub trait DeviceRegistryTrait {
    /// Registers a device for a user. When `device_id` is `None` a fresh
    /// identifier is generated. Returns the stored device.
    fn register(
        &self,
        user_id: i64,
        name: &str,
        device_id: Option<&str>,
    ) -> Result<Device, DeviceError>;

    /// Resolves a device reference for a user. The reference may be the
    /// internal row id (decimal string) or the client device identifier.
    fn resolve(&self, user_id: i64, device_ref: &str) -> Result<Device, DeviceError>;

    /// Looks up a device by its client identifier only.
    fn find_by_client_id(&self, user_id: i64, device_id: &str) -> Result<Device, DeviceError>;

    /// Lists all devices registered to a user.
    fn list_for_user(&self, user_id: i64) -> Result<Vec<Device>, DeviceError>;

    /// Removes a device and every bookmark it owns.
    fn remove(&self, user_id: i64, internal_id: i64) -> Result<(), DeviceError>;
}

/// Device registry backed by a SQLite connection.
pub struct DeviceRegistry<'a> {
    conn: &'a Connection,
}

impl<'a> DeviceRegistry<'a> {
    /// Creates a new `DeviceRegistry` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Overwrites a device's running bookmark counter.
    ///
    /// Called by the sync coordinator inside its chunk transaction; the
    /// registry itself never changes the counter.
    pub fn set_bookmark_count(&self, internal_id: i64, count: i64) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE devices SET bookmark_count = ?1, updated_at = ?2 WHERE id = ?3",
            params![count, Self::now(), internal_id],
        )?;
        Ok(())
    }

    /// Variant of [`DeviceRegistryTrait::find_by_client_id`] that keeps the
    /// raw `rusqlite::Error`, for use inside the coordinator's transaction
    /// where lock contention must stay classifiable.
    pub fn find_by_client_id_raw(
        &self,
        user_id: i64,
        device_id: &str,
    ) -> Result<Option<Device>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, user_id, device_id, name, bookmark_count, created_at, updated_at \
                 FROM devices WHERE device_id = ?1 AND user_id = ?2",
                params![device_id, user_id],
                Self::row_to_device,
            )
            .optional()
    }

    /// Reads a single device row into a struct.
    fn row_to_device(row: &rusqlite::Row) -> rusqlite::Result<Device> {
        Ok(Device {
            id: row.get(0)?,
            user_id: row.get(1)?,
            device_id: row.get(2)?,
            name: row.get(3)?,
            bookmark_count: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn find_by_internal_id(
        &self,
        user_id: i64,
        internal_id: i64,
    ) -> Result<Option<Device>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, user_id, device_id, name, bookmark_count, created_at, updated_at \
                 FROM devices WHERE id = ?1 AND user_id = ?2",
                params![internal_id, user_id],
                Self::row_to_device,
            )
            .optional()
    }
}

impl<'a> DeviceRegistryTrait for DeviceRegistry<'a> {
    fn register(
        &self,
        user_id: i64,
        name: &str,
        device_id: Option<&str>,
    ) -> Result<Device, DeviceError> {
        let client_id = match device_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let existing = self
            .find_by_client_id_raw(user_id, &client_id)
            .map_err(|e| DeviceError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(DeviceError::AlreadyRegistered(client_id));
        }

        let now = Self::now();
        self.conn
            .execute(
                "INSERT INTO devices (user_id, device_id, name, bookmark_count, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)",
                params![user_id, client_id, name, now],
            )
            .map_err(|e| DeviceError::Database(e.to_string()))?;

        let internal_id = self.conn.last_insert_rowid();
        Ok(Device {
            id: internal_id,
            user_id,
            device_id: client_id,
            name: name.to_string(),
            bookmark_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn resolve(&self, user_id: i64, device_ref: &str) -> Result<Device, DeviceError> {
        // Internal ids are decimal strings; anything else can only be a
        // client identifier. A client identifier that happens to be numeric
        // is still found by the second lookup.
        if let Ok(internal_id) = device_ref.parse::<i64>() {
            if let Some(device) = self
                .find_by_internal_id(user_id, internal_id)
                .map_err(|e| DeviceError::Database(e.to_string()))?
            {
                return Ok(device);
            }
        }

        self.find_by_client_id_raw(user_id, device_ref)
            .map_err(|e| DeviceError::Database(e.to_string()))?
            .ok_or_else(|| DeviceError::NotFound(device_ref.to_string()))
    }

    fn find_by_client_id(&self, user_id: i64, device_id: &str) -> Result<Device, DeviceError> {
        self.find_by_client_id_raw(user_id, device_id)
            .map_err(|e| DeviceError::Database(e.to_string()))?
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))
    }

    fn list_for_user(&self, user_id: i64) -> Result<Vec<Device>, DeviceError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, device_id, name, bookmark_count, created_at, updated_at \
                 FROM devices WHERE user_id = ?1 ORDER BY id",
            )
            .map_err(|e| DeviceError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_device)
            .map_err(|e| DeviceError::Database(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| DeviceError::Database(e.to_string()))?);
        }
        Ok(results)
    }

    fn remove(&self, user_id: i64, internal_id: i64) -> Result<(), DeviceError> {
        let device = self
            .find_by_internal_id(user_id, internal_id)
            .map_err(|e| DeviceError::Database(e.to_string()))?
            .ok_or_else(|| DeviceError::NotFound(internal_id.to_string()))?;

        // Bookmarks first: the foreign key on bookmarks.device_id would
        // otherwise reject the device delete.
        self.conn
            .execute(
                "DELETE FROM bookmarks WHERE device_id = ?1",
                params![device.id],
            )
            .map_err(|e| DeviceError::Database(e.to_string()))?;
        self.conn
            .execute("DELETE FROM devices WHERE id = ?1", params![device.id])
            .map_err(|e| DeviceError::Database(e.to_string()))?;
        Ok(())
    }
}
