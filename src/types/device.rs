use serde::{Deserialize, Serialize};

/// A registered sync device.
///
/// `id` is the internal row id; `device_id` is the client-chosen identifier
/// presented in sync requests. The pair (user_id, device_id) is unique.
/// `bookmark_count` is a running counter written by the sync coordinator —
/// it matches the actual row count only after a sync run delivers all of
/// its chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub device_id: String,
    pub name: String,
    pub bookmark_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
