//! Write operations for modifying data in DynamoDB tables.
//!
//! - Updating attributes of an item, optionally under a condition
//! - Batch writing items

/// Batch write item operation and the buffered batch writer.
pub mod batch_write_item;

/// Update item operation for replacing attributes.
pub mod update_item;
