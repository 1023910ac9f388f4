//! Remote store seam.
//!
//! Command handlers talk to DynamoDB only through [`Store`], one method per
//! remote call. [`DynamoStore`] implements it over the AWS SDK client.

#[cfg(test)]
pub(crate) mod memory;

use crate::{
    Error, Result, config,
    common::item,
    read, schema,
    write::{self, batch_write_item::BatchWriteItem},
};

use aws_sdk_dynamodb::{Client, error::SdkError, operation, types};
use serde_json::Value;
use std::{collections, fmt, future::Future};

/// Remote operations needed by the command handlers.
pub trait Store {
    /// Fetch the key schema of a table.
    fn describe_key_schema(&self, table_name: &str) -> impl Future<Output = Result<schema::KeySchema>>;

    /// Read one item; `None` when no item has the key.
    fn get_item(
        &self,
        get_item: read::get_item::GetItem<Value>,
    ) -> impl Future<Output = Result<Option<item::Item>>>;

    /// Put up to [`write::batch_write_item::MAX_BATCH_SIZE`] items, returning
    /// the ones the service left unprocessed.
    fn batch_write(
        &self,
        table_name: &str,
        items: Vec<item::Item>,
    ) -> impl Future<Output = Result<Vec<item::Item>>>;

    /// Apply an update, failing with [`Error::ConditionFailed`] when its condition does not hold.
    fn update_item(
        &self,
        update_item: write::update_item::UpdateItem<Value>,
    ) -> impl Future<Output = Result<()>>;

    /// Return the first page of a scan.
    fn scan(&self, scan: read::scan::Scan) -> impl Future<Output = Result<Vec<item::Item>>>;
}

/// Classify an SDK failure, recognising a missing table.
fn table_error<E, R>(
    operation: &'static str,
    table_name: &str,
    err: SdkError<E, R>,
    is_missing_table: impl Fn(&E) -> bool,
) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    let missing = matches!(&err, SdkError::ServiceError(inner) if is_missing_table(inner.err()));
    if missing {
        Error::TableNotFound(table_name.to_string())
    } else {
        Error::service(operation, err)
    }
}

fn key_type(key_type: &types::KeyType) -> Option<schema::KeyType> {
    match key_type {
        types::KeyType::Hash => Some(schema::KeyType::Hash),
        types::KeyType::Range => Some(schema::KeyType::Range),
        _ => None,
    }
}

fn scalar_type(attribute_type: &types::ScalarAttributeType) -> Option<schema::ScalarType> {
    match attribute_type {
        types::ScalarAttributeType::S => Some(schema::ScalarType::S),
        types::ScalarAttributeType::N => Some(schema::ScalarType::N),
        types::ScalarAttributeType::B => Some(schema::ScalarType::B),
        _ => None,
    }
}

fn key_schema(table: &types::TableDescription) -> schema::KeySchema {
    let attribute_types: collections::HashMap<&str, schema::ScalarType> = table
        .attribute_definitions()
        .iter()
        .filter_map(|definition| {
            scalar_type(definition.attribute_type())
                .map(|attribute_type| (definition.attribute_name(), attribute_type))
        })
        .collect();
    let elements = table
        .key_schema()
        .iter()
        .filter_map(|element| {
            let key_type = key_type(element.key_type())?;
            Some(schema::KeySchemaElement {
                attribute_name: element.attribute_name().to_string(),
                key_type,
                attribute_type: attribute_types.get(element.attribute_name()).copied(),
            })
        })
        .collect();
    schema::KeySchema(elements)
}

/// [`Store`] backed by the AWS SDK.
#[derive(Clone, Debug)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the resolved settings.
    pub async fn connect(settings: &config::ClientSettings) -> Result<Self> {
        let sdk_config = settings.load().await?;
        Ok(Self::new(Client::new(&sdk_config)))
    }
}

impl Store for DynamoStore {
    #[tracing::instrument(name = "ddbcli.describe_table", skip(self), err(level = "debug"))]
    async fn describe_key_schema(&self, table_name: &str) -> Result<schema::KeySchema> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|err| {
                table_error("DescribeTable", table_name, err, |err| {
                    matches!(
                        err,
                        operation::describe_table::DescribeTableError::ResourceNotFoundException(_)
                    )
                })
            })?;
        let table = output
            .table
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        Ok(key_schema(&table))
    }

    #[tracing::instrument(
        name = "ddbcli.get_item",
        skip_all,
        fields(table = %get_item.table_name),
        err(level = "debug")
    )]
    async fn get_item(
        &self,
        get_item: read::get_item::GetItem<Value>,
    ) -> Result<Option<item::Item>> {
        let table_name = get_item.table_name.clone();
        let output = get_item.build(&self.client)?.send().await.map_err(|err| {
            table_error("GetItem", &table_name, err, |err| {
                matches!(
                    err,
                    operation::get_item::GetItemError::ResourceNotFoundException(_)
                )
            })
        })?;
        Ok(output.item.map(item::from_attribute_map))
    }

    #[tracing::instrument(
        name = "ddbcli.batch_write_item",
        skip(self, items),
        fields(items = items.len()),
        err(level = "debug")
    )]
    async fn batch_write(
        &self,
        table_name: &str,
        items: Vec<item::Item>,
    ) -> Result<Vec<item::Item>> {
        let batch_write_item = BatchWriteItem {
            items,
            table_name: table_name.to_string(),
        };
        let output = batch_write_item
            .build(&self.client)?
            .send()
            .await
            .map_err(|err| {
                table_error("BatchWriteItem", table_name, err, |err| {
                    matches!(
                        err,
                        operation::batch_write_item::BatchWriteItemError::ResourceNotFoundException(_)
                    )
                })
            })?;
        let unprocessed = output
            .unprocessed_items
            .unwrap_or_default()
            .remove(table_name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|write_request| write_request.put_request)
            .map(|put_request| item::from_attribute_map(put_request.item))
            .collect();
        Ok(unprocessed)
    }

    #[tracing::instrument(
        name = "ddbcli.update_item",
        skip_all,
        fields(table = %update_item.table_name),
        err(level = "debug")
    )]
    async fn update_item(&self, update_item: write::update_item::UpdateItem<Value>) -> Result<()> {
        let table_name = update_item.table_name.clone();
        update_item.build(&self.client)?.send().await.map_err(|err| {
            let condition_failed = matches!(
                &err,
                SdkError::ServiceError(inner) if matches!(
                    inner.err(),
                    operation::update_item::UpdateItemError::ConditionalCheckFailedException(_)
                )
            );
            if condition_failed {
                Error::ConditionFailed {
                    table: table_name.clone(),
                }
            } else {
                table_error("UpdateItem", &table_name, err, |err| {
                    matches!(
                        err,
                        operation::update_item::UpdateItemError::ResourceNotFoundException(_)
                    )
                })
            }
        })?;
        Ok(())
    }

    #[tracing::instrument(
        name = "ddbcli.scan",
        skip_all,
        fields(table = %scan.table_name),
        err(level = "debug")
    )]
    async fn scan(&self, scan: read::scan::Scan) -> Result<Vec<item::Item>> {
        let table_name = scan.table_name.clone();
        let output = scan.send(&self.client).await.map_err(|err| {
            table_error("Scan", &table_name, err, |err| {
                matches!(
                    err,
                    operation::scan::ScanError::ResourceNotFoundException(_)
                )
            })
        })?;
        if output.last_evaluated_key.is_some() {
            tracing::warn!(
                table = %table_name,
                "scan returned only the first page; remaining items were not read"
            );
        }
        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(item::from_attribute_map)
            .collect();
        Ok(items)
    }
}
