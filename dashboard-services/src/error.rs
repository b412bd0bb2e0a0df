//! Error types for the service layer

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors raised by key-value storage and the archive built on it
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {size} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Storage lock poisoned")]
    LockError,
}

impl ArchiveError {
    /// Does this failure plausibly mean the store is over capacity
    pub fn is_capacity(&self) -> bool {
        match self {
            ArchiveError::QuotaExceeded { .. } => true,
            ArchiveError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, ErrorCode::DiskFull | ErrorCode::TooBig)
            }
            _ => false,
        }
    }
}

/// Failure of a whole aggregation cycle
#[derive(Debug, Error)]
pub enum NewsServiceError {
    #[error("Aggregation cycle aborted: {0}")]
    CycleAborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_classification() {
        assert!(ArchiveError::QuotaExceeded { size: 10, quota: 5 }.is_capacity());

        let full = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
            None,
        );
        assert!(ArchiveError::Database(full).is_capacity());

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(!ArchiveError::Database(busy).is_capacity());
        assert!(!ArchiveError::LockError.is_capacity());
    }
}
