//! Table key schemas and their per-user cache.
//!
//! Commands that address a single item need the names of the table's key
//! attributes. Those are fetched from the service once per table and then kept
//! in the user configuration file, so later invocations against the same table
//! skip the `DescribeTable` round trip.
//!
//! The cache is never refreshed on its own: if a table is recreated with a
//! different key schema, the cached copy stays stale until
//! [`SchemaCache::invalidate`] or [`SchemaCache::clear`] is called.

use crate::{Error, Result, common, config, store};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a key attribute.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum KeyType {
    /// Partition key.
    #[serde(rename = "HASH")]
    Hash,
    /// Sort key.
    #[serde(rename = "RANGE")]
    Range,
}

/// Scalar type of a key attribute.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ScalarType {
    /// String.
    S,
    /// Number.
    N,
    /// Binary.
    B,
}

/// One attribute of a table's primary key.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeySchemaElement {
    /// Name of the key attribute.
    #[serde(rename = "AttributeName")]
    pub attribute_name: String,
    /// Whether it is the partition or the sort key.
    #[serde(rename = "KeyType")]
    pub key_type: KeyType,
    /// Declared type, if known.
    #[serde(
        rename = "AttributeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attribute_type: Option<ScalarType>,
}

/// Ordered key schema of a table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeySchema(pub Vec<KeySchemaElement>);

impl KeySchema {
    fn find(&self, key_type: KeyType) -> Option<&KeySchemaElement> {
        self.0.iter().find(|element| element.key_type == key_type)
    }

    /// The partition (HASH) key attribute.
    pub fn partition_key(&self) -> Option<&KeySchemaElement> {
        self.find(KeyType::Hash)
    }

    /// The sort (RANGE) key attribute, for composite primary keys.
    pub fn sort_key(&self) -> Option<&KeySchemaElement> {
        self.find(KeyType::Range)
    }

    /// Build a primary key from command-line values.
    ///
    /// The sort key value must be given exactly when the table has a sort key.
    pub fn keys(
        &self,
        table_name: &str,
        partition_value: &str,
        sort_value: Option<&str>,
    ) -> Result<common::key::Keys<Value>> {
        let partition = self.partition_key().ok_or_else(|| {
            Error::Config(format!("cached key schema of {table_name} has no HASH key"))
        })?;
        let partition_key = common::key::Key::parse(
            &partition.attribute_name,
            partition_value,
            partition.attribute_type,
        )?;
        let sort_key = match (self.sort_key(), sort_value) {
            (Some(sort), Some(value)) => Some(common::key::Key::parse(
                &sort.attribute_name,
                value,
                sort.attribute_type,
            )?),
            (None, None) => None,
            (Some(sort), None) => {
                return Err(Error::InvalidArgument(format!(
                    "table {table_name} has a sort key; a value for {} is required",
                    sort.attribute_name
                )));
            }
            (None, Some(_)) => {
                return Err(Error::InvalidArgument(format!(
                    "table {table_name} has no sort key"
                )));
            }
        };
        let keys = common::key::Keys {
            partition_key,
            sort_key,
        };
        Ok(keys)
    }
}

/// Read-through cache of key schemas, persisted in the user configuration file.
#[derive(Debug)]
pub struct SchemaCache {
    file: config::ConfigFile,
}

impl SchemaCache {
    /// Wrap a loaded configuration file.
    pub fn new(file: config::ConfigFile) -> Self {
        Self { file }
    }

    /// Cached schema of a table, without any remote call.
    pub fn get(&self, table_name: &str) -> Option<&KeySchema> {
        self.file.config.key_schema.get(table_name)
    }

    /// Return the cached schema of a table, fetching and storing it on a miss.
    pub async fn get_or_fetch<S: store::Store>(
        &mut self,
        store: &S,
        table_name: &str,
    ) -> Result<KeySchema> {
        if let Some(key_schema) = self.get(table_name) {
            tracing::debug!(table = table_name, "key schema cache hit");
            return Ok(key_schema.clone());
        }
        tracing::debug!(table = table_name, "key schema cache miss");
        let key_schema = store.describe_key_schema(table_name).await?;
        self.file
            .config
            .key_schema
            .insert(table_name.to_string(), key_schema.clone());
        self.persist();
        Ok(key_schema)
    }

    /// Drop the cached schema of one table. Returns whether it was cached.
    pub fn invalidate(&mut self, table_name: &str) -> bool {
        let removed = self.file.config.key_schema.remove(table_name).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop every cached schema.
    pub fn clear(&mut self) {
        self.file.config.key_schema.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.file.save() {
            tracing::warn!(
                path = %self.file.path().display(),
                "could not save key schema cache: {err}"
            );
        }
    }
}
