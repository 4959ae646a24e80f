//! Crate-scoped error handling.
//!
//! Every fallible operation in this crate returns one of the variants below.
//! Errors are propagated to the caller without internal retries; whether a
//! failed write is safe to resubmit is a decision for the ingestion layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type exposed to users of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The shard already holds an open store handle.
    #[error("shard already open")]
    AlreadyOpen,

    /// The operation requires an open store handle and none is held.
    #[error("shard is not open")]
    NotOpen,

    /// Another process held the store's file lock past the bounded wait.
    #[error("timed out waiting for store lock on {path}")]
    LockTimeout {
        /// Path of the contended database file.
        path: PathBuf,
    },

    /// Filesystem or storage-engine failure outside the write path.
    #[error("storage i/o failure: {0}")]
    Io(String),

    /// A stored point record could not be decoded.
    #[error("corrupt point record: {0}")]
    CorruptRecord(String),

    /// A field value is not one of the recognized scalar kinds.
    #[error("unsupported field value type: {0}")]
    UnsupportedValueType(String),

    /// Invalid input parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A point already exists at this (series, timestamp) key and
    /// overwriting was not requested.
    #[error("duplicate point for series {series_id} at {timestamp}")]
    DuplicatePoint {
        /// Series the rejected point belongs to.
        series_id: u32,
        /// Timestamp of the rejected point, in nanoseconds.
        timestamp: i64,
    },

    /// A write transaction failed to apply or commit. The store remains at
    /// its last committed state.
    #[error("write failed: {0}")]
    WriteFailed(String),
}
