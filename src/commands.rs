//! Command handlers.
//!
//! Each handler turns one parsed [`Command`] into remote calls through a
//! [`Store`] and returns the value to print, if any.

use crate::{
    Error, Result,
    cli::{Cli, Command},
    common::item,
    config, read, schema,
    store::{DynamoStore, Store},
    write::{self, batch_write_item::BatchWriter},
};

use indexmap::IndexMap;
use serde_json::Value;
use std::io;

/// Resolve the configuration, connect and run the command.
pub async fn run(cli: Cli) -> Result<Option<Value>> {
    let dir = config::config_dir()?;
    let file = config::ConfigFile::load(&dir)?;
    let settings = cli.client_settings().or_config(&file.config);
    let store = DynamoStore::connect(&settings).await?;
    let mut cache = schema::SchemaCache::new(file);
    dispatch(cli.command, &store, &mut cache, io::stdin().lock()).await
}

/// Run one command against `store`, reading bulk input from `stdin` when the
/// command line carries none.
#[tracing::instrument(name = "ddbcli.command", skip_all, fields(table = command.table()))]
pub async fn dispatch<S: Store>(
    command: Command,
    store: &S,
    cache: &mut schema::SchemaCache,
    stdin: impl io::Read,
) -> Result<Option<Value>> {
    match command {
        Command::Get {
            table,
            key,
            consistent_read,
        } => get(store, cache, table, key, consistent_read).await,
        Command::Put { table, items } => put(store, table, items, stdin).await,
        Command::Update {
            table,
            key,
            updates,
            condition,
            sort_key,
        } => {
            let update = Update {
                table,
                key,
                updates,
                condition,
                sort_key,
            };
            update.run(store, cache, stdin).await
        }
        Command::Scan {
            table,
            consistent_read,
        } => scan(store, table, consistent_read).await,
    }
}

async fn get<S: Store>(
    store: &S,
    cache: &mut schema::SchemaCache,
    table: String,
    key: Vec<String>,
    consistent_read: bool,
) -> Result<Option<Value>> {
    let Some(partition_value) = key.first() else {
        return Err(Error::InvalidArgument(
            "get requires a partition key value".to_string(),
        ));
    };
    let key_schema = cache.get_or_fetch(store, &table).await?;
    let keys = key_schema.keys(&table, partition_value, key.get(1).map(String::as_str))?;
    let rendered_key = keys.to_string();
    let get_item = read::get_item::GetItem {
        consistent_read: consistent_read.then_some(true),
        keys,
        table_name: table.clone(),
    };
    match store.get_item(get_item).await? {
        Some(item) => Ok(Some(Value::Object(item))),
        None => Err(Error::ItemNotFound {
            table,
            key: rendered_key,
        }),
    }
}

fn into_item(value: Value) -> Result<item::Item> {
    match value {
        Value::Object(item) => Ok(item),
        other => Err(Error::InvalidArgument(format!(
            "items must be JSON objects, got {other}"
        ))),
    }
}

async fn put<S: Store>(
    store: &S,
    table: String,
    items: Vec<Value>,
    stdin: impl io::Read,
) -> Result<Option<Value>> {
    let items = if items.is_empty() {
        match serde_json::from_reader(stdin)? {
            Value::Array(items) => items,
            _ => {
                return Err(Error::InvalidArgument(
                    "standard input must hold a JSON array of items".to_string(),
                ));
            }
        }
    } else {
        items
    };
    let items = items
        .into_iter()
        .map(into_item)
        .collect::<Result<Vec<_>>>()?;
    let mut writer = BatchWriter::new(store, table);
    for item in items {
        writer.put_item(item).await?;
    }
    let written = writer.finish().await?;
    tracing::info!(written, "put items");
    Ok(None)
}

struct Update {
    table: String,
    key: String,
    updates: Vec<(String, Value)>,
    condition: Option<crate::common::condition::KeyCondition<Value>>,
    sort_key: Option<String>,
}

impl Update {
    /// Assignments in order; a later assignment to the same name wins but
    /// keeps the position of the first.
    fn assignments(updates: Vec<(String, Value)>, stdin: impl io::Read) -> Result<IndexMap<String, Value>> {
        let assignments: IndexMap<String, Value> = if updates.is_empty() {
            match serde_json::from_reader(stdin)? {
                Value::Object(object) => object.into_iter().collect(),
                _ => {
                    return Err(Error::InvalidArgument(
                        "standard input must hold a JSON object of attributes".to_string(),
                    ));
                }
            }
        } else {
            let mut assignments = IndexMap::with_capacity(updates.len());
            for (name, value) in updates {
                assignments.insert(name, value);
            }
            assignments
        };
        if assignments.is_empty() {
            return Err(Error::InvalidArgument(
                "update requires at least one attribute".to_string(),
            ));
        }
        Ok(assignments)
    }

    async fn run<S: Store>(
        self,
        store: &S,
        cache: &mut schema::SchemaCache,
        stdin: impl io::Read,
    ) -> Result<Option<Value>> {
        let updates = Self::assignments(self.updates, stdin)?;
        let key_schema = cache.get_or_fetch(store, &self.table).await?;
        let keys = key_schema.keys(&self.table, &self.key, self.sort_key.as_deref())?;
        let update_item = write::update_item::UpdateItem {
            keys,
            updates,
            condition: self.condition,
            table_name: self.table,
        };
        store.update_item(update_item).await?;
        Ok(None)
    }
}

async fn scan<S: Store>(store: &S, table: String, consistent_read: bool) -> Result<Option<Value>> {
    let scan = read::scan::Scan {
        consistent_read: consistent_read.then_some(true),
        table_name: table,
    };
    let items = store.scan(scan).await?;
    Ok(Some(Value::Array(items.into_iter().map(Value::Object).collect())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::condition,
        schema::{KeySchema, KeySchemaElement, KeyType, ScalarType},
        store::memory::MemoryStore,
    };

    use rstest::rstest;
    use serde_json::json;

    fn element(name: &str, key_type: KeyType, attribute_type: ScalarType) -> KeySchemaElement {
        KeySchemaElement {
            attribute_name: name.to_string(),
            key_type,
            attribute_type: Some(attribute_type),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::default()
            .with_table(
                "users",
                KeySchema(vec![element("id", KeyType::Hash, ScalarType::S)]),
            )
            .with_table(
                "history",
                KeySchema(vec![
                    element("user", KeyType::Hash, ScalarType::S),
                    element("version", KeyType::Range, ScalarType::N),
                ]),
            )
            .with_items(
                "users",
                vec![json!({"id": "a", "count": 3, "name": "Ann"})],
            )
            .with_items(
                "history",
                vec![
                    json!({"user": "a", "version": 1, "email": "old@example.com"}),
                    json!({"user": "a", "version": 2, "email": "new@example.com"}),
                ],
            )
    }

    fn cache(dir: &tempfile::TempDir) -> schema::SchemaCache {
        schema::SchemaCache::new(config::ConfigFile::load(dir.path()).unwrap())
    }

    fn get_command(table: &str, key: &[&str]) -> Command {
        Command::Get {
            table: table.to_string(),
            key: key.iter().map(|key| key.to_string()).collect(),
            consistent_read: false,
        }
    }

    fn update_command(updates: Vec<(&str, Value)>, condition: Option<&str>) -> Command {
        Command::Update {
            table: "users".to_string(),
            key: "a".to_string(),
            updates: updates
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            condition: condition.map(|condition| condition.parse().unwrap()),
            sort_key: None,
        }
    }

    async fn run(store: &MemoryStore, cache: &mut schema::SchemaCache, command: Command, stdin: &str) -> Result<Option<Value>> {
        dispatch(command, store, cache, stdin.as_bytes()).await
    }

    fn user(store: &MemoryStore) -> Value {
        Value::Object(store.items("users").remove(0))
    }

    #[rstest]
    #[case::partition_key(
        get_command("users", &["a"]),
        json!({"id": "a", "count": 3, "name": "Ann"})
    )]
    #[case::numeric_sort_key(
        get_command("history", &["a", "2"]),
        json!({"user": "a", "version": 2, "email": "new@example.com"})
    )]
    #[tokio::test]
    async fn test_get(#[case] command: Command, #[case] expected: Value) {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let actual = run(&store, &mut cache(&dir), command, "").await.unwrap();
        assert_eq!(actual, Some(expected));
    }

    #[tokio::test]
    async fn test_get_uses_cached_key_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let mut cache = cache(&dir);
        run(&store, &mut cache, get_command("users", &["a"]), "").await.unwrap();
        run(&store, &mut cache, get_command("users", &["a"]), "").await.unwrap();
        assert_eq!(store.describe_calls(), 1);
    }

    #[rstest]
    #[case::missing_item(get_command("users", &["z"]), "ItemNotFound")]
    #[case::missing_partition_key(get_command("users", &[]), "InvalidArgument")]
    #[case::missing_sort_key(get_command("history", &["a"]), "InvalidArgument")]
    #[case::non_numeric_sort_key(get_command("history", &["a", "latest"]), "InvalidArgument")]
    #[case::missing_table(get_command("orders", &["a"]), "TableNotFound")]
    #[tokio::test]
    async fn test_get_invalid(#[case] command: Command, #[case] kind: &str) {
        let dir = tempfile::tempdir().unwrap();
        let actual = run(&store(), &mut cache(&dir), command, "").await.unwrap_err();
        assert_eq!(actual.kind(), kind, "{actual:?}");
    }

    #[tokio::test]
    async fn test_put_reads_items_from_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = Command::Put {
            table: "users".to_string(),
            items: vec![],
        };
        let actual = run(&store, &mut cache(&dir), command, r#"[{"id": "b"}, {"id": "c"}]"#).await;
        assert_eq!(actual.unwrap(), None);
        let ids: Vec<Value> = store
            .items("users")
            .into_iter()
            .map(|item| item["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = Command::Put {
            table: "users".to_string(),
            items: vec![json!({"id": "a", "name": "Anna"})],
        };
        run(&store, &mut cache(&dir), command, "").await.unwrap();
        assert_eq!(user(&store), json!({"id": "a", "name": "Anna"}));
        assert_eq!(store.describe_calls(), 0);
    }

    #[rstest]
    #[case::stdin_not_array(vec![], r#"{"id": "b"}"#, "InvalidArgument")]
    #[case::stdin_not_json(vec![], "id=b", "JsonError")]
    #[case::item_not_object(vec![json!({"id": "b"}), json!("c")], "", "InvalidArgument")]
    #[tokio::test]
    async fn test_put_invalid(#[case] items: Vec<Value>, #[case] stdin: &str, #[case] kind: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = Command::Put {
            table: "users".to_string(),
            items,
        };
        let actual = run(&store, &mut cache(&dir), command, stdin).await.unwrap_err();
        assert_eq!(actual.kind(), kind, "{actual:?}");
        assert_eq!(store.items("users").len(), 1);
    }

    #[rstest]
    #[case::unconditional(
        update_command(vec![("count", json!(10))], None),
        json!({"id": "a", "count": 10, "name": "Ann"})
    )]
    #[case::condition_holds(
        update_command(vec![("count", json!(10))], Some("count < 5")),
        json!({"id": "a", "count": 10, "name": "Ann"})
    )]
    #[case::later_assignment_wins(
        update_command(vec![("name", json!("Anna")), ("name", json!("Annie"))], None),
        json!({"id": "a", "count": 3, "name": "Annie"})
    )]
    #[case::begins_with(
        update_command(vec![("tags", json!(["x"]))], Some("name begins_with \"An\"")),
        json!({"id": "a", "count": 3, "name": "Ann", "tags": ["x"]})
    )]
    #[tokio::test]
    async fn test_update(#[case] command: Command, #[case] expected: Value) {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let actual = run(&store, &mut cache(&dir), command, "").await.unwrap();
        assert_eq!(actual, None);
        assert_eq!(user(&store), expected);
    }

    #[tokio::test]
    async fn test_update_failed_condition_leaves_item_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = update_command(vec![("count", json!(10))], Some("count > 5"));
        let actual = run(&store, &mut cache(&dir), command, "").await;
        assert!(
            matches!(actual, Err(Error::ConditionFailed { ref table }) if table == "users"),
            "{actual:?}"
        );
        assert_eq!(user(&store), json!({"id": "a", "count": 3, "name": "Ann"}));
    }

    #[tokio::test]
    async fn test_update_reads_attributes_from_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = update_command(vec![], None);
        run(&store, &mut cache(&dir), command, r#"{"name": "Anna", "active": true}"#)
            .await
            .unwrap();
        assert_eq!(
            user(&store),
            json!({"id": "a", "count": 3, "name": "Anna", "active": true})
        );
    }

    #[tokio::test]
    async fn test_update_creates_missing_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = Command::Update {
            table: "history".to_string(),
            key: "b".to_string(),
            updates: vec![("email".to_string(), json!("b@example.com"))],
            condition: None,
            sort_key: Some("1".to_string()),
        };
        run(&store, &mut cache(&dir), command, "").await.unwrap();
        let created = store.items("history").pop().unwrap();
        assert_eq!(
            Value::Object(created),
            json!({"user": "b", "version": 1, "email": "b@example.com"})
        );
    }

    #[rstest]
    #[case::empty_stdin_object(update_command(vec![], None), "{}", "InvalidArgument")]
    #[case::stdin_not_object(update_command(vec![], None), "[1]", "InvalidArgument")]
    #[case::missing_attribute(
        update_command(vec![("count", json!(1))], Some("missing = 1")),
        "",
        "ConditionFailed"
    )]
    #[tokio::test]
    async fn test_update_invalid(#[case] command: Command, #[case] stdin: &str, #[case] kind: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let actual = run(&store, &mut cache(&dir), command, stdin).await.unwrap_err();
        assert_eq!(actual.kind(), kind, "{actual:?}");
        assert_eq!(user(&store), json!({"id": "a", "count": 3, "name": "Ann"}));
    }

    #[tokio::test]
    async fn test_update_condition_with_in_operator() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let command = Command::Update {
            table: "users".to_string(),
            key: "a".to_string(),
            updates: vec![("count".to_string(), json!(4))],
            condition: Some(condition::KeyCondition {
                name: "count".to_string(),
                condition: condition::Condition::In(vec![json!(1), json!(3)]),
            }),
            sort_key: None,
        };
        run(&store, &mut cache(&dir), command, "").await.unwrap();
        assert_eq!(user(&store)["count"], json!(4));
    }

    #[rstest]
    #[case::empty_table(MemoryStore::default().with_table("users", KeySchema::default()), json!([]))]
    #[case::all_items(
        MemoryStore::default()
            .with_table("users", KeySchema::default())
            .with_items("users", vec![json!({"id": "a"}), json!({"id": "b"})]),
        json!([{"id": "a"}, {"id": "b"}])
    )]
    #[case::first_page_only(
        MemoryStore::default()
            .with_table("users", KeySchema::default())
            .with_items("users", vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "c"})])
            .with_page_size(2),
        json!([{"id": "a"}, {"id": "b"}])
    )]
    #[tokio::test]
    async fn test_scan(#[case] store: MemoryStore, #[case] expected: Value) {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::Scan {
            table: "users".to_string(),
            consistent_read: false,
        };
        let actual = run(&store, &mut cache(&dir), command, "").await.unwrap();
        assert_eq!(actual, Some(expected));
    }
}
