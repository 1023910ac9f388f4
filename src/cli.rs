//! Command-line surface.

use crate::{common::condition, config, logging};

use serde_json::Value;
use std::ffi;

/// Environment variable naming a default table.
pub const TABLE_ENV: &str = "DYNAMODB_TABLE";

/// Global options that take a separate value.
const VALUE_OPTIONS: [&str; 4] = ["--log-level", "--region", "--endpoint-url", "--profile"];

/// DynamoDB Command Line Interface
#[derive(Clone, Debug, PartialEq, clap::Parser)]
#[command(name = "ddbcli", version)]
pub struct Cli {
    /// Log level; below `error`, failures are printed in full instead of logged.
    #[arg(long, value_enum, ignore_case = true, default_value_t)]
    pub log_level: logging::LogLevel,

    /// AWS region, overriding the configuration file and the environment.
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint URL, e.g. of a local DynamoDB.
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Named AWS profile.
    #[arg(long)]
    pub profile: Option<String>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Client settings given on the command line.
    pub fn client_settings(&self) -> config::ClientSettings {
        config::ClientSettings {
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// Item operations.
#[derive(Clone, Debug, PartialEq, clap::Subcommand)]
pub enum Command {
    /// Get an item by its primary key.
    Get {
        /// Table name.
        table: String,
        /// Partition key value, followed by the sort key value for composite keys.
        #[arg(num_args = 0..=2)]
        key: Vec<String>,
        /// Use a strongly consistent read.
        #[arg(long)]
        consistent_read: bool,
    },
    /// Put items, given as JSON objects or as a JSON array on standard input.
    Put {
        /// Table name.
        table: String,
        /// Items as JSON objects.
        #[arg(value_parser = parse_json)]
        items: Vec<Value>,
    },
    /// Update attributes of an item, creating it if needed.
    Update {
        /// Table name.
        table: String,
        /// Partition key value.
        key: String,
        /// `name=value` assignments with JSON values; a JSON object is read
        /// from standard input when none are given.
        #[arg(value_parser = parse_assignment)]
        updates: Vec<(String, Value)>,
        /// Condition as `<attribute> <operator> <json value>`, e.g. `count > 5`.
        #[arg(long)]
        condition: Option<condition::KeyCondition<Value>>,
        /// Sort key value, for tables with a composite primary key.
        #[arg(long)]
        sort_key: Option<String>,
    },
    /// Scan a table, returning the first page of items.
    Scan {
        /// Table name.
        table: String,
        /// Use a strongly consistent read.
        #[arg(long)]
        consistent_read: bool,
    },
}

impl Command {
    /// Table the command operates on.
    pub fn table(&self) -> &str {
        match self {
            Self::Get { table, .. }
            | Self::Put { table, .. }
            | Self::Update { table, .. }
            | Self::Scan { table, .. } => table,
        }
    }
}

fn parse_json(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(text)
}

fn parse_assignment(text: &str) -> Result<(String, Value), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {text:?}"))?;
    if name.is_empty() {
        return Err(format!("missing attribute name in {text:?}"));
    }
    let value = serde_json::from_str(value).map_err(|err| format!("invalid JSON value for {name}: {err}"))?;
    Ok((name.to_string(), value))
}

/// Insert `table` right after the subcommand token.
///
/// `args` starts with the program name. Global options before the
/// subcommand, and their values, are skipped. Without a subcommand the
/// arguments are returned unchanged.
pub fn inject_table(mut args: Vec<ffi::OsString>, table: Option<ffi::OsString>) -> Vec<ffi::OsString> {
    let Some(table) = table else {
        return args;
    };
    let mut index = 1;
    while let Some(arg) = args.get(index).and_then(|arg| arg.to_str()) {
        if !arg.starts_with('-') {
            break;
        }
        index += if VALUE_OPTIONS.contains(&arg) { 2 } else { 1 };
    }
    if index < args.len() {
        args.insert(index + 1, table);
    }
    args
}
