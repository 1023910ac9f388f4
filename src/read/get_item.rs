use crate::common;

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::{Error, Result};
use std::collections;

/// get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    consistent_read: Option<bool>,
    keys: collections::HashMap<String, types::AttributeValue>,
    table_name: String,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use ddbcli::{common, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let get_item = read::get_item::GetItem {
///     keys: common::key::Keys {
///         partition_key: common::key::Key {
///             name: "id".to_string(),
///             value: "1".to_string(),
///         },
///         ..Default::default()
///     },
///     table_name: "users".to_string(),
///     ..Default::default()
/// };
/// get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem<T> {
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// The primary key of the item to retrieve.
    pub keys: common::key::Keys<T>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl<T: Serialize> TryFrom<GetItem<T>> for GetItemInput {
    type Error = Error;

    fn try_from(get_item: GetItem<T>) -> Result<Self> {
        let keys = get_item.keys.try_into()?;
        let operation = Self {
            consistent_read: get_item.consistent_read,
            keys,
            table_name: get_item.table_name,
        };
        Ok(operation)
    }
}

impl<T: Serialize> GetItem<T> {
    /// Convert the key and prepare the request without sending it.
    pub fn build(self, client: &Client) -> Result<operation::get_item::builders::GetItemFluentBuilder> {
        let get_item: GetItemInput = self.try_into()?;
        let builder = client
            .get_item()
            .set_consistent_read(get_item.consistent_read)
            .set_key(Some(get_item.keys))
            .table_name(get_item.table_name);
        Ok(builder)
    }

    /// Execute the get item operation.
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        self.build(client)
            .map_err(error::BuildError::other)?
            .send()
            .await
    }
}
