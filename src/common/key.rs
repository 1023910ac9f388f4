use crate::schema::ScalarType;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use serde_json::Value;
use std::{collections, fmt};

/// Key component.
///
/// ```rust
/// use ddbcli::common::key;
///
/// let key = key::Key {
///     name: "id".to_string(),
///     value: "1".to_string(),
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

impl Key<Value> {
    /// Build a key from its command-line text, typed after the attribute definition.
    ///
    /// Number keys are sent as numbers; string keys, and keys whose type is
    /// unknown, are sent as strings.
    pub fn parse(
        name: &str,
        value: &str,
        attribute_type: Option<ScalarType>,
    ) -> crate::Result<Self> {
        let value = match attribute_type {
            None | Some(ScalarType::S) => Value::String(value.to_string()),
            Some(ScalarType::N) => value.parse().map(Value::Number).map_err(|_| {
                crate::Error::InvalidArgument(format!("key {name} expects a number, got {value:?}"))
            })?,
            Some(ScalarType::B) => {
                return Err(crate::Error::InvalidArgument(format!(
                    "key {name} is binary; binary keys cannot be given on the command line"
                )));
            }
        };
        let key = Self {
            name: name.to_string(),
            value,
        };
        Ok(key)
    }
}

/// Primary key (partition key and optional sort key).
///
/// ```rust
/// use ddbcli::common::key;
///
/// let keys = key::Keys {
///     partition_key: key::Key {
///         name: "id".to_string(),
///         value: "1".to_string(),
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys<T> {
    /// The partition key (required).
    pub partition_key: Key<T>,
    /// The sort key (optional, only for tables with composite primary keys).
    pub sort_key: Option<Key<T>>,
}

impl<T: Serialize> TryFrom<Keys<T>> for collections::HashMap<String, types::AttributeValue> {
    type Error = Error;

    fn try_from(key: Keys<T>) -> Result<Self> {
        let partition_key_value = to_attribute_value(key.partition_key.value)?;
        let mut keys = Self::from([(key.partition_key.name, partition_key_value)]);
        if let Some(sort_key) = key.sort_key {
            let sort_key_value = to_attribute_value(sort_key.value)?;
            keys.insert(sort_key.name, sort_key_value);
        }
        Ok(keys)
    }
}

impl<T: fmt::Display> fmt::Display for Keys<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.partition_key.name, self.partition_key.value)?;
        if let Some(sort_key) = &self.sort_key {
            write!(f, ", {}={}", sort_key.name, sort_key.value)?;
        }
        Ok(())
    }
}
