#![deny(missing_docs)]

//! # ddbcli
//!
//! A command-line client for Amazon DynamoDB items.
//!
//! ## Overview
//!
//! Four subcommands cover the common record operations:
//! - `get` reads one item by its primary key
//! - `put` writes items in batches of at most 25
//! - `update` replaces attributes, optionally under a condition
//! - `scan` returns the first page of a table
//!
//! Key attribute names are looked up once per table and cached in the user
//! configuration file (see [`schema::SchemaCache`]).
//!
//! The request types can also be used on their own:
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use ddbcli::{common, write};
//! use indexmap::IndexMap;
//! use serde_json::Value;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
//! let update_item = write::update_item::UpdateItem {
//!     keys: common::key::Keys {
//!         partition_key: common::key::Key {
//!             name: "id".to_string(),
//!             value: Value::String("1".to_string()),
//!         },
//!         ..Default::default()
//!     },
//!     updates: IndexMap::from([("name".to_string(), Value::String("Jane".to_string()))]),
//!     condition: Some("count >= 1".parse()?),
//!     table_name: "users".to_string(),
//! };
//! // Sent as "SET #set0 = :set0" under "#condition >= :condition_gte0"
//! update_item.send(&client).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@cli`] and [`mod@commands`] - Argument parsing and command handlers
//! - [`mod@schema`] - Key schemas and their cache
//! - [`mod@store`] - The remote store seam
//! - [`mod@read`] and [`mod@write`] - Request types (GetItem, Scan, UpdateItem, BatchWriteItem)
//! - [`mod@common`] - Keys, conditions and item conversion
//! - [`mod@report`], [`mod@output`] and [`mod@logging`] - What reaches the terminal

/// Command-line arguments.
pub mod cli;

/// Command handlers.
pub mod commands;

/// Common utilities for keys, conditions, and items.
pub mod common;

/// User configuration and client settings.
pub mod config;

/// Error types.
pub mod error;

/// Logging and the error log.
pub mod logging;

/// Result rendering.
pub mod output;

/// Read operations for retrieving data from DynamoDB tables.
pub mod read;

/// Failure reporting.
pub mod report;

/// Key schemas and the key schema cache.
pub mod schema;

/// Remote store abstraction.
pub mod store;

/// Write operations for modifying data in DynamoDB tables.
pub mod write;

pub use error::{Error, Result};
