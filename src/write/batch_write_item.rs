use crate::{Error, common::item, store};

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::Result;
use std::{collections, mem};

/// Maximum number of write requests DynamoDB accepts in one `BatchWriteItem` call.
pub const MAX_BATCH_SIZE: usize = 25;

/// Consecutive flushes without any accepted item after which the writer gives up.
const MAX_STALLED_FLUSHES: usize = 10;

/// Batch write item operation, restricted to puts into a single table.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use ddbcli::write;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let batch_write = write::batch_write_item::BatchWriteItem {
///     items: vec![serde_json::json!({"id": "1", "name": "John"})],
///     table_name: "users".to_string(),
/// };
/// batch_write.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem<T> {
    /// Items to put into the table.
    pub items: Vec<T>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl<T: Serialize> TryFrom<BatchWriteItem<T>> for operation::batch_write_item::BatchWriteItemInput {
    type Error = serde_dynamo::Error;

    fn try_from(batch_write_item: BatchWriteItem<T>) -> Result<Self> {
        let mut write_requests = Vec::with_capacity(batch_write_item.items.len());
        for item in batch_write_item.items {
            let item = item::to_attribute_map(item)?;
            let put_request = types::PutRequest::builder()
                .set_item(Some(item))
                .build()
                .map_err(<serde_dynamo::Error as serde::ser::Error>::custom)?;
            let write_request = types::WriteRequest::builder()
                .set_put_request(Some(put_request))
                .build();
            write_requests.push(write_request);
        }
        let request_items =
            collections::HashMap::from([(batch_write_item.table_name, write_requests)]);
        Self::builder()
            .set_request_items(Some(request_items))
            .build()
            .map_err(<serde_dynamo::Error as serde::ser::Error>::custom)
    }
}

impl<T: Serialize> BatchWriteItem<T> {
    /// Convert the items and prepare the request without sending it.
    pub fn build(
        self,
        client: &Client,
    ) -> Result<operation::batch_write_item::builders::BatchWriteItemFluentBuilder> {
        let batch_write_item: operation::batch_write_item::BatchWriteItemInput =
            self.try_into()?;
        let builder = client
            .batch_write_item()
            .set_request_items(batch_write_item.request_items);
        Ok(builder)
    }

    /// Execute the batch write item operation.
    pub async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<
        operation::batch_write_item::BatchWriteItemOutput,
        error::SdkError<operation::batch_write_item::BatchWriteItemError>,
    > {
        self.build(client)
            .map_err(error::BuildError::other)?
            .send()
            .await
    }
}

/// Buffered writer that groups puts into `BatchWriteItem` requests.
///
/// Items are sent whenever a full batch is buffered. Items the service
/// returns as unprocessed are queued again and resent with a later batch.
/// [`BatchWriter::finish`] must be called to send the remainder and to learn
/// about failures; dropping the writer discards the buffered items.
///
/// A failure does not undo batches that were already accepted.
#[derive(Debug)]
pub struct BatchWriter<'a, S> {
    buffer: Vec<item::Item>,
    stalled_flushes: usize,
    store: &'a S,
    table_name: String,
    written: usize,
}

impl<'a, S: store::Store> BatchWriter<'a, S> {
    /// Open a writer for one table.
    pub fn new(store: &'a S, table_name: impl Into<String>) -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_BATCH_SIZE),
            stalled_flushes: 0,
            store,
            table_name: table_name.into(),
            written: 0,
        }
    }

    /// Queue an item, sending a batch once enough items are buffered.
    pub async fn put_item(&mut self, item: item::Item) -> crate::Result<()> {
        self.buffer.push(item);
        if self.buffer.len() >= MAX_BATCH_SIZE {
            self.flush().await?;
        }
        Ok(())
    }

    /// Send everything still buffered and return the number of items written.
    pub async fn finish(mut self) -> crate::Result<usize> {
        while !self.buffer.is_empty() {
            self.flush().await?;
        }
        Ok(self.written)
    }

    async fn flush(&mut self) -> crate::Result<()> {
        let count = self.buffer.len().min(MAX_BATCH_SIZE);
        let rest = self.buffer.split_off(count);
        let batch = mem::replace(&mut self.buffer, rest);
        let unprocessed = self.store.batch_write(&self.table_name, batch).await?;
        let accepted = count.saturating_sub(unprocessed.len());
        self.written += accepted;
        tracing::debug!(
            table = %self.table_name,
            accepted,
            unprocessed = unprocessed.len(),
            "flushed batch"
        );
        if accepted == 0 {
            self.stalled_flushes += 1;
            if self.stalled_flushes >= MAX_STALLED_FLUSHES {
                return Err(Error::Unprocessed {
                    table: self.table_name.clone(),
                    count: unprocessed.len() + self.buffer.len(),
                });
            }
        } else {
            self.stalled_flushes = 0;
        }
        self.buffer.extend(unprocessed);
        Ok(())
    }
}
