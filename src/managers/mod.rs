// Syncmarks state managers
// Managers handle durable state: bookmark rows, device registration, chunk ingestion.

pub mod bookmark_store;
pub mod device_registry;
pub mod sync_coordinator;
