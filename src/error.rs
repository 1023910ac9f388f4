//! Error taxonomy shared by every command.
//!
//! Handlers never recover from errors themselves: everything propagates to the
//! single boundary in [`crate::report`], which maps each kind to a message and
//! an exit code.

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use std::{error, fmt, io, result};

/// Boxed error used to carry SDK failures as sources.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Result type used throughout the crate.
pub type Result<T> = result::Result<T, Error>;

/// Errors raised by the command handlers and their supporting layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No AWS region could be resolved from flags, config file or environment.
    #[error("no AWS region is configured")]
    NoRegion,

    /// The user configuration could not be resolved or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The table does not exist.
    #[error("table {0} does not exist")]
    TableNotFound(String),

    /// A point read found no item under the given key.
    #[error("no item with key {key} in table {table}")]
    ItemNotFound {
        /// Table that was read.
        table: String,
        /// Rendered primary key.
        key: String,
    },

    /// A conditional write was rejected because its condition did not hold.
    #[error("the conditional request on table {table} failed")]
    ConditionFailed {
        /// Table that was written.
        table: String,
    },

    /// Any other failure reported by the service or the transport.
    #[error("{operation} failed: {message}")]
    Service {
        /// Remote operation name.
        operation: &'static str,
        /// Message including the SDK error context.
        message: String,
        /// Underlying SDK error.
        #[source]
        source: BoxError,
    },

    /// A command-line or standard-input argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An item could not be converted to or from DynamoDB attribute values.
    #[error("could not convert item: {0}")]
    Conversion(#[from] serde_dynamo::Error),

    /// JSON input could not be parsed or output could not be rendered.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file access failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The batch writer gave up on items the service kept returning unprocessed.
    #[error("{count} items were left unprocessed by the batch write to {table}")]
    Unprocessed {
        /// Table that was written.
        table: String,
        /// Number of items never accepted.
        count: usize,
    },
}

impl Error {
    /// Short name of the error kind, printed in the one-line summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoRegion => "NoRegion",
            Self::Config(_) => "ConfigError",
            Self::TableNotFound(_) => "TableNotFound",
            Self::ItemNotFound { .. } => "ItemNotFound",
            Self::ConditionFailed { .. } => "ConditionFailed",
            Self::Service { .. } => "ServiceError",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Conversion(_) => "ConversionError",
            Self::Json(_) => "JsonError",
            Self::Io(_) => "IoError",
            Self::Unprocessed { .. } => "UnprocessedItems",
        }
    }

    /// Wrap an SDK failure that has no more specific classification.
    pub(crate) fn service<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: error::Error + Send + Sync + 'static,
        R: fmt::Debug + Send + Sync + 'static,
    {
        let message = DisplayErrorContext(&err).to_string();
        Self::Service {
            operation,
            message,
            source: Box::new(err),
        }
    }
}

/// Render an error followed by its chain of sources, one per line.
pub fn trace(err: &(dyn error::Error + 'static)) -> String {
    let mut trace = format!("{err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\nCaused by: {cause}"));
        source = cause.source();
    }
    trace
}
