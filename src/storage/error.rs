//! Storage layer error types.

use crate::storage::page::{PageId, TableId};
use thiserror::Error;

/// Errors that can occur in the storage layer.
///
/// End-of-file detection relies on `PageNotFound` being distinguishable
/// from `Io`, so the two are never collapsed into each other.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("page not found: {0}")]
    PageNotFound(PageId),

    #[error("no table registered under {0}")]
    UnknownTable(TableId),

    #[error("tuple not found: slot {slot_id} is empty or deleted")]
    TupleNotFound { slot_id: u16 },

    #[error("invalid slot ID: {slot_id} (tuple count: {tuple_count})")]
    InvalidSlotId { slot_id: u16, tuple_count: u16 },

    #[error("page is full: requires {required} bytes but only {available} available")]
    PageFull { required: usize, available: usize },

    #[error("iterator state error: {0}")]
    IteratorState(&'static str),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
