//! Unit tests for the DeviceRegistry public API.
//!
//! These tests exercise registration, resolution and removal through the
//! `DeviceRegistryTrait` interface, using an in-memory SQLite database.

use rusqlite::params;
use syncmarks::database::Database;
use syncmarks::managers::device_registry::{DeviceRegistry, DeviceRegistryTrait};
use syncmarks::types::errors::DeviceError;

/// Helper: create a fresh in-memory database.
fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

#[test]
fn test_register_with_explicit_client_id() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Laptop", Some("chrome-laptop")).unwrap();
    assert_eq!(device.user_id, 1);
    assert_eq!(device.device_id, "chrome-laptop");
    assert_eq!(device.name, "Laptop");
    assert_eq!(device.bookmark_count, 0);
    assert!(device.id > 0, "internal id should be assigned by the database");
}

#[test]
fn test_register_generates_client_id_when_absent() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Phone", None).unwrap();
    assert!(
        !device.device_id.is_empty(),
        "a client identifier should be generated"
    );

    // The generated identifier resolves like any other.
    let resolved = registry.resolve(1, &device.device_id).unwrap();
    assert_eq!(resolved.id, device.id);
}

#[test]
fn test_register_rejects_duplicate_client_id() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    registry.register(1, "Laptop", Some("dev-1")).unwrap();
    let err = registry.register(1, "Laptop again", Some("dev-1")).unwrap_err();
    assert!(matches!(err, DeviceError::AlreadyRegistered(_)));
}

#[test]
fn test_resolve_by_internal_and_client_id() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Laptop", Some("dev-1")).unwrap();

    let by_internal = registry.resolve(1, &device.id.to_string()).unwrap();
    assert_eq!(by_internal.device_id, "dev-1");

    let by_client = registry.resolve(1, "dev-1").unwrap();
    assert_eq!(by_client.id, device.id);
}

/// A numeric client identifier must still resolve even though it parses as
/// an internal id that does not exist.
#[test]
fn test_resolve_numeric_client_id_falls_back() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Tablet", Some("90210")).unwrap();
    let resolved = registry.resolve(1, "90210").unwrap();
    assert_eq!(resolved.id, device.id);
}

#[test]
fn test_resolve_never_crosses_users() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Laptop", Some("dev-1")).unwrap();

    // Another user cannot see it, by client id or internal id.
    let err = registry.resolve(2, "dev-1").unwrap_err();
    assert!(matches!(err, DeviceError::NotFound(_)));
    let err = registry.resolve(2, &device.id.to_string()).unwrap_err();
    assert!(matches!(err, DeviceError::NotFound(_)));
}

#[test]
fn test_list_for_user_is_scoped() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    registry.register(1, "Laptop", Some("dev-1")).unwrap();
    registry.register(1, "Phone", Some("dev-2")).unwrap();
    registry.register(2, "Other", Some("dev-3")).unwrap();

    let devices = registry.list_for_user(1).unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices.iter().all(|d| d.user_id == 1));
}

#[test]
fn test_remove_deletes_device_and_bookmarks() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Laptop", Some("dev-1")).unwrap();
    db.connection()
        .execute(
            "INSERT INTO bookmarks (id, user_id, device_id, parent_id, title, url, date_added, is_folder) \
             VALUES ('bm-1', 1, ?1, NULL, 'Work', NULL, 0, 1)",
            params![device.id],
        )
        .unwrap();

    registry.remove(1, device.id).unwrap();

    let err = registry.resolve(1, "dev-1").unwrap_err();
    assert!(matches!(err, DeviceError::NotFound(_)));
    let remaining: i64 = db
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE device_id = ?1",
            params![device.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0, "removing a device removes its bookmarks");
}

#[test]
fn test_remove_rejects_foreign_device() {
    let db = setup();
    let registry = DeviceRegistry::new(db.connection());

    let device = registry.register(1, "Laptop", Some("dev-1")).unwrap();
    let err = registry.remove(2, device.id).unwrap_err();
    assert!(matches!(err, DeviceError::NotFound(_)));

    // Still there for its owner.
    assert!(registry.resolve(1, "dev-1").is_ok());
}
