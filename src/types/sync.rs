use serde::{Deserialize, Serialize};

use crate::types::bookmark::{BookmarkNode, BookmarkPayload};

/// One chunk of a client's full bookmark upload.
///
/// A sync run is a sequence of these with `chunk_index` running from 0 to
/// `total_chunks - 1`. Chunk 0 is the structural signal to wipe the
/// device's prior state; ordering is the client's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncChunkRequest {
    pub device_id: String,
    pub bookmarks: Vec<BookmarkPayload>,
    pub chunk_index: u32,
    pub total_chunks: u32,
}

/// Result of successfully ingesting one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReceipt {
    /// Number of records upserted from this chunk.
    pub synced_count: usize,
    /// The device's running counter after this chunk.
    pub total_count: i64,
}

/// The reconstructed tree for one device, as returned to clients.
///
/// `total_bookmarks` counts the filtered flat records, not tree nodes:
/// when a search term excludes a folder, its matching children still count
/// here even though they drop out of the visible tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeListing {
    pub bookmarks: Vec<BookmarkNode>,
    pub total_bookmarks: usize,
}
