//! Chunk Ingestion Coordinator for Syncmarks.
//!
//! Accepts a client's full bookmark set as an ordered sequence of chunks.
//! Each chunk runs in one IMMEDIATE SQLite transaction: resolve the device,
//! wipe prior state when the chunk index is 0, upsert the chunk's rows,
//! bump the device's running counter. The transaction's write lock is the
//! serialization point that keeps two concurrent runs for the same device
//! from interleaving their wipe and counter update.
//!
//! Lock contention (`SQLITE_BUSY` / `SQLITE_LOCKED`) retries the entire
//! chunk under an explicit [`RetryPolicy`]; every other failure rolls the
//! chunk back and surfaces immediately.

use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::warn;

use crate::database::Database;
use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use crate::managers::device_registry::DeviceRegistry;
use crate::types::errors::SyncError;
use crate::types::sync::{ChunkReceipt, SyncChunkRequest};

/// Retry configuration for contended chunk transactions.
///
/// Passed to the coordinator explicitly rather than living in module-level
/// constants, so deployments and tests can tune it.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per chunk, the first one included.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Trait defining the chunk ingestion operation.
pub trait SyncCoordinatorTrait {
    /// Ingests one chunk for the authenticated user's device.
    ///
    /// # Errors
    /// `SyncError::DeviceNotFound` when the device identifier does not
    /// resolve for this user, `SyncError::InvalidChunk` for malformed
    /// payloads (rejected before any store mutation),
    /// `SyncError::RetriesExhausted` once contention outlives the retry
    /// ceiling, `SyncError::Database` for any other persistence failure.
    fn sync_chunk(
        &self,
        db: &Mutex<Database>,
        user_id: i64,
        request: &SyncChunkRequest,
    ) -> Result<ChunkReceipt, SyncError>;
}

/// Coordinator for chunked bookmark ingestion.
pub struct SyncCoordinator {
    retry: RetryPolicy,
}

impl SyncCoordinator {
    /// Creates a coordinator with the given retry policy.
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Rejects malformed chunks before anything touches the store.
    fn validate(request: &SyncChunkRequest) -> Result<(), SyncError> {
        if request.total_chunks == 0 {
            return Err(SyncError::InvalidChunk("totalChunks must be at least 1".into()));
        }
        if request.chunk_index >= request.total_chunks {
            return Err(SyncError::InvalidChunk(format!(
                "chunkIndex {} out of range for {} chunks",
                request.chunk_index, request.total_chunks
            )));
        }
        for record in &request.bookmarks {
            if record.id.is_empty() {
                return Err(SyncError::InvalidChunk("bookmark id must not be empty".into()));
            }
            if record.title.is_empty() {
                return Err(SyncError::InvalidChunk(format!(
                    "bookmark {} has an empty title",
                    record.id
                )));
            }
        }
        Ok(())
    }

    /// Runs one chunk as a single IMMEDIATE transaction.
    ///
    /// IMMEDIATE takes the write lock up front, so the wipe, the upserts
    /// and the counter update commit or roll back together.
    fn apply_chunk(
        conn: &mut Connection,
        user_id: i64,
        request: &SyncChunkRequest,
    ) -> Result<ChunkReceipt, SyncError> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_store_error)?;

        let receipt = {
            let registry = DeviceRegistry::new(&tx);
            let device = registry
                .find_by_client_id_raw(user_id, &request.device_id)
                .map_err(map_store_error)?
                .ok_or_else(|| SyncError::DeviceNotFound(request.device_id.clone()))?;

            let store = BookmarkStore::new(&tx);
            let mut total_count = device.bookmark_count;

            if request.chunk_index == 0 {
                store
                    .delete_all_for_device(device.id)
                    .map_err(map_store_error)?;
                total_count = 0;
            }

            let synced_count = store
                .upsert_many(user_id, device.id, &request.bookmarks)
                .map_err(map_store_error)?;

            total_count += synced_count as i64;
            registry
                .set_bookmark_count(device.id, total_count)
                .map_err(map_store_error)?;

            ChunkReceipt {
                synced_count,
                total_count,
            }
        };

        tx.commit().map_err(map_store_error)?;
        Ok(receipt)
    }
}

impl SyncCoordinatorTrait for SyncCoordinator {
    fn sync_chunk(
        &self,
        db: &Mutex<Database>,
        user_id: i64,
        request: &SyncChunkRequest,
    ) -> Result<ChunkReceipt, SyncError> {
        Self::validate(request)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            // The lock guard lives only for the attempt: the backoff sleep
            // below must not hold the database.
            let outcome = {
                let mut guard = db
                    .lock()
                    .map_err(|_| SyncError::Database("database mutex poisoned".into()))?;
                Self::apply_chunk(guard.connection_mut(), user_id, request)
            };

            match outcome {
                Err(SyncError::Contention(reason)) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(SyncError::RetriesExhausted(self.retry.max_attempts));
                    }
                    warn!(
                        attempt,
                        chunk_index = request.chunk_index,
                        device = %request.device_id,
                        "chunk transaction contended, retrying: {}",
                        reason
                    );
                    thread::sleep(self.retry.backoff);
                }
                other => return other,
            }
        }
    }
}

/// Maps a store failure to the sync taxonomy: busy/locked is retryable
/// contention, everything else is terminal.
fn map_store_error(err: rusqlite::Error) -> SyncError {
    if is_contention(&err) {
        SyncError::Contention(err.to_string())
    } else {
        SyncError::Database(err.to_string())
    }
}

fn is_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
