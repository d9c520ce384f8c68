use std::fmt;

// === AuthError ===

/// Errors from verifying an authentication token.
#[derive(Debug)]
pub enum AuthError {
    /// No token was supplied with the request.
    MissingToken,
    /// The token is malformed or its signature does not verify.
    InvalidToken,
    /// The token verified but its expiry has passed.
    Expired,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "No token, authorization denied"),
            AuthError::InvalidToken => write!(f, "Token is not valid"),
            AuthError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for AuthError {}

// === DeviceError ===

/// Errors related to device registry operations.
#[derive(Debug)]
pub enum DeviceError {
    /// No device matched the given reference for this user.
    NotFound(String),
    /// A device with the given client identifier is already registered.
    AlreadyRegistered(String),
    /// Database operation failed.
    Database(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound(device_ref) => write!(f, "Device not found: {}", device_ref),
            DeviceError::AlreadyRegistered(id) => {
                write!(f, "Device already registered: {}", id)
            }
            DeviceError::Database(msg) => write!(f, "Device database error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

// === TreeError ===

/// Errors from reconstructing a bookmark tree.
#[derive(Debug, PartialEq, Eq)]
pub enum TreeError {
    /// A record's parent chain loops back on itself.
    CycleDetected(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::CycleDetected(id) => {
                write!(f, "Bookmark parent chain contains a cycle at: {}", id)
            }
        }
    }
}

impl std::error::Error for TreeError {}

// === SyncError ===

/// Errors from ingesting a sync chunk.
#[derive(Debug)]
pub enum SyncError {
    /// The request's device identifier does not resolve for this user.
    DeviceNotFound(String),
    /// The chunk payload is malformed; nothing was written.
    InvalidChunk(String),
    /// The store reported lock contention. Retried internally; only
    /// surfaced wrapped in `RetriesExhausted` once the ceiling is hit.
    Contention(String),
    /// Lock contention persisted through every allowed attempt.
    RetriesExhausted(u32),
    /// Any other persistence failure; the chunk was rolled back.
    Database(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::DeviceNotFound(device_id) => {
                write!(f, "Device not found: {}", device_id)
            }
            SyncError::InvalidChunk(msg) => write!(f, "Invalid sync chunk: {}", msg),
            SyncError::Contention(msg) => write!(f, "Store lock contention: {}", msg),
            SyncError::RetriesExhausted(attempts) => {
                write!(f, "Max retries reached after {} attempts", attempts)
            }
            SyncError::Database(msg) => write!(f, "Sync database error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === QueryError ===

/// Errors from listing a device's bookmark tree.
#[derive(Debug)]
pub enum QueryError {
    /// No device matched the given reference for this user.
    DeviceNotFound(String),
    /// The stored records do not form a valid tree.
    Tree(TreeError),
    /// Database operation failed.
    Database(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::DeviceNotFound(device_ref) => {
                write!(f, "Device not found: {}", device_ref)
            }
            QueryError::Tree(err) => write!(f, "Tree reconstruction failed: {}", err),
            QueryError::Database(msg) => write!(f, "Query database error: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<TreeError> for QueryError {
    fn from(err: TreeError) -> Self {
        QueryError::Tree(err)
    }
}
