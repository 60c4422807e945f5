//! Table registration and schema descriptors.

pub mod registry;
pub mod schema;

pub use registry::TableRegistry;
pub use schema::{Column, Schema};

pub use crate::storage::page::TableId;
