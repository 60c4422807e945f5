//! Access layer for tuple-oriented operations.
//!
//! This module provides abstractions for reading tables as collections of
//! logical records:
//!
//! - **HeapFile**: a table stored as consecutive fixed-size pages
//! - **TableScanner**: lazy sequential scan over all tuples of a table
//! - **Tuple**: individual records with unique TupleIds
//! - **Value** / **DataType**: type-safe representation of column values
//!
//! The access layer handles the mapping from logical record positions to
//! pages, so higher layers work with records rather than raw bytes.

pub mod heap;
pub mod scan;
pub mod tuple;
pub mod value;

pub use heap::HeapFile;
pub use scan::TableScanner;
pub use tuple::{Tuple, TupleId};
pub use value::{deserialize_values, serialize_values, DataType, Value};
