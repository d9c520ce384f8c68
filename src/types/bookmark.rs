use serde::{Deserialize, Serialize};

/// A flat bookmark row as persisted in the store.
///
/// `id` is assigned by the client and stable across syncs from the same
/// client node; rows are scoped to one (user, device) pair and the triple
/// (id, user_id, device_id) is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkRecord {
    pub id: String,
    pub user_id: i64,
    pub device_id: i64,
    pub parent_id: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub date_added: i64,
    pub is_folder: bool,
}

/// A bookmark as uploaded by a client inside a sync chunk.
///
/// Field names follow the wire protocol (camelCase). `url` is absent for
/// folders; `date_added` is milliseconds since the UNIX epoch as reported
/// by the client's bookmark API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPayload {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    pub date_added: i64,
    pub is_folder: bool,
}

/// A node in the reconstructed bookmark tree returned to clients.
///
/// Children are fully ordered: folders before links, then titles compared
/// case-insensitively, at every level of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub date_added: i64,
    pub is_folder: bool,
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    /// Builds a leaf node (no children yet) from a stored record.
    pub fn from_record(record: &BookmarkRecord) -> Self {
        Self {
            id: record.id.clone(),
            parent_id: record.parent_id.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            date_added: record.date_added,
            is_folder: record.is_folder,
            children: Vec::new(),
        }
    }
}
