//! Transaction identifiers.
//!
//! The storage layer itself is transaction-agnostic: handles minted here
//! are carried through scans and buffer pool fetches opaquely, for the
//! benefit of lock management layered above.

pub mod id;

pub use id::{TransactionId, TransactionIdGenerator};
