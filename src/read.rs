//! Read operations for retrieving data from DynamoDB tables.
//!
//! - Getting individual items by primary key
//! - Scanning the first page of a table

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Scan operation for retrieving the first page of a table.
pub mod scan;
