//! In-process [`Store`] used by the tests.

use super::Store;
use crate::{
    Error, Result,
    common::{condition, item, key},
    read, schema,
    write::{self, batch_write_item::MAX_BATCH_SIZE},
};

use serde_json::Value;
use std::{cmp, collections, sync};

#[derive(Debug, Default)]
struct Table {
    key_schema: schema::KeySchema,
    items: Vec<item::Item>,
}

#[derive(Debug, Default)]
struct State {
    tables: collections::HashMap<String, Table>,
    describe_calls: usize,
    batch_sizes: Vec<usize>,
    rejected_batches: usize,
    page_size: Option<usize>,
}

/// Tables held in memory, with counters for the calls the tests inspect.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: sync::Mutex<State>,
}

impl MemoryStore {
    /// Add a table, or replace the key schema of an existing one.
    pub(crate) fn with_table(self, table_name: &str, key_schema: schema::KeySchema) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let table = state.tables.entry(table_name.to_string()).or_default();
            table.key_schema = key_schema;
        }
        self
    }

    /// Seed a table with items.
    pub(crate) fn with_items(self, table_name: &str, items: Vec<Value>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let table = state.tables.entry(table_name.to_string()).or_default();
            for item in items {
                let Value::Object(item) = item else {
                    panic!("seed items must be objects");
                };
                table.items.push(item);
            }
        }
        self
    }

    /// Limit the number of items a scan returns.
    pub(crate) fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(page_size);
        self
    }

    /// Leave the last item of each of the next `count` batches unprocessed.
    pub(crate) fn with_rejected_batches(self, count: usize) -> Self {
        self.state.lock().unwrap().rejected_batches = count;
        self
    }

    pub(crate) fn describe_calls(&self) -> usize {
        self.state.lock().unwrap().describe_calls
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().batch_sizes.clone()
    }

    pub(crate) fn items(&self, table_name: &str) -> Vec<item::Item> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table_name)
            .map(|table| table.items.clone())
            .unwrap_or_default()
    }
}

fn has_key(item: &item::Item, keys: &key::Keys<Value>) -> bool {
    let matches = |key: &key::Key<Value>| item.get(&key.name) == Some(&key.value);
    matches(&keys.partition_key) && keys.sort_key.as_ref().is_none_or(matches)
}

fn has_same_key(item: &item::Item, other: &item::Item, key_schema: &schema::KeySchema) -> bool {
    key_schema
        .0
        .iter()
        .all(|element| item.get(&element.attribute_name) == other.get(&element.attribute_name))
}

fn compare(left: &Value, right: &Value) -> Option<cmp::Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

fn holds(condition: &condition::KeyCondition<Value>, item: Option<&item::Item>) -> bool {
    let Some(current) = item.and_then(|item| item.get(&condition.name)) else {
        return false;
    };
    let ordering = |value: &Value| compare(current, value);
    match &condition.condition {
        condition::Condition::BeginsWith(prefix) => {
            current.as_str().is_some_and(|current| current.starts_with(prefix.as_str()))
        }
        condition::Condition::Between(low, high) => {
            ordering(low).is_some_and(cmp::Ordering::is_ge)
                && ordering(high).is_some_and(cmp::Ordering::is_le)
        }
        condition::Condition::Contains(value) => match (current, value) {
            (Value::String(current), Value::String(value)) => current.contains(value.as_str()),
            (Value::Array(current), value) => current.contains(value),
            _ => false,
        },
        condition::Condition::Equals(value) => current == value,
        condition::Condition::GreaterThan(value) => ordering(value).is_some_and(cmp::Ordering::is_gt),
        condition::Condition::GreaterThanOrEqual(value) => {
            ordering(value).is_some_and(cmp::Ordering::is_ge)
        }
        condition::Condition::In(values) => values.contains(current),
        condition::Condition::LessThan(value) => ordering(value).is_some_and(cmp::Ordering::is_lt),
        condition::Condition::LessThanOrEqual(value) => {
            ordering(value).is_some_and(cmp::Ordering::is_le)
        }
        condition::Condition::NotEqual(value) => current != value,
    }
}

impl Store for MemoryStore {
    async fn describe_key_schema(&self, table_name: &str) -> Result<schema::KeySchema> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls += 1;
        state
            .tables
            .get(table_name)
            .map(|table| table.key_schema.clone())
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))
    }

    async fn get_item(&self, get_item: read::get_item::GetItem<Value>) -> Result<Option<item::Item>> {
        let state = self.state.lock().unwrap();
        let table = state
            .tables
            .get(&get_item.table_name)
            .ok_or_else(|| Error::TableNotFound(get_item.table_name.clone()))?;
        Ok(table
            .items
            .iter()
            .find(|item| has_key(item, &get_item.keys))
            .cloned())
    }

    async fn batch_write(&self, table_name: &str, mut items: Vec<item::Item>) -> Result<Vec<item::Item>> {
        assert!(items.len() <= MAX_BATCH_SIZE, "batch of {} items", items.len());
        let mut state = self.state.lock().unwrap();
        state.batch_sizes.push(items.len());
        let mut unprocessed = Vec::new();
        if state.rejected_batches > 0 {
            state.rejected_batches -= 1;
            unprocessed.extend(items.pop());
        }
        let table = state
            .tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        for item in items {
            table
                .items
                .retain(|existing| !has_same_key(existing, &item, &table.key_schema));
            table.items.push(item);
        }
        Ok(unprocessed)
    }

    async fn update_item(&self, update_item: write::update_item::UpdateItem<Value>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let table = state
            .tables
            .get_mut(&update_item.table_name)
            .ok_or_else(|| Error::TableNotFound(update_item.table_name.clone()))?;
        let position = table
            .items
            .iter()
            .position(|item| has_key(item, &update_item.keys));
        if let Some(condition) = &update_item.condition {
            let current = position.map(|position| &table.items[position]);
            if !holds(condition, current) {
                return Err(Error::ConditionFailed {
                    table: update_item.table_name.clone(),
                });
            }
        }
        let position = position.unwrap_or_else(|| {
            let mut item = item::Item::new();
            let keys = &update_item.keys;
            for key in std::iter::once(&keys.partition_key).chain(keys.sort_key.as_ref()) {
                item.insert(key.name.clone(), key.value.clone());
            }
            table.items.push(item);
            table.items.len() - 1
        });
        table.items[position].extend(update_item.updates);
        Ok(())
    }

    async fn scan(&self, scan: read::scan::Scan) -> Result<Vec<item::Item>> {
        let state = self.state.lock().unwrap();
        let table = state
            .tables
            .get(&scan.table_name)
            .ok_or_else(|| Error::TableNotFound(scan.table_name.clone()))?;
        let page_size = state.page_size.unwrap_or(usize::MAX);
        Ok(table.items.iter().take(page_size).cloned().collect())
    }
}
