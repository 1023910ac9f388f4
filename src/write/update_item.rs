use crate::common;

use aws_sdk_dynamodb::{Client, error, operation, types};
use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Identifier used for the SET placeholders.
const SET_PLACEHOLDER: &str = "set";

/// Render attribute replacements as the body of a `SET` clause.
///
/// Placeholders are numbered (`#set0 = :set0`) so attribute names never have
/// to be valid expression tokens themselves.
fn get_set_expression<T: Serialize>(updates: IndexMap<String, T>) -> Result<common::ExpressionInput> {
    let mut operations = Vec::with_capacity(updates.len());
    for (index, (name, value)) in updates.into_iter().enumerate() {
        let name_placeholder = format!("#{SET_PLACEHOLDER}{index}");
        let value_placeholder = format!(":{SET_PLACEHOLDER}{index}");
        let value = to_attribute_value(value)?;
        let expression = format!("{name_placeholder} = {value_placeholder}");
        let operation = common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(name_placeholder, name)]),
            expression_attribute_values: collections::HashMap::from([(value_placeholder, value)]),
        };
        operations.push(operation);
    }
    let mut operation = common::ExpressionInput::merge(", ", operations);
    operation.expression = format!("SET {}", operation.expression);
    Ok(operation)
}

/// update item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct UpdateItemInput {
    condition_expression: Option<String>,
    expression_attribute_names: Option<collections::HashMap<String, String>>,
    expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
    keys: collections::HashMap<String, types::AttributeValue>,
    table_name: String,
    update_expression: String,
}

/// Update item operation.
///
/// Every entry of `updates` replaces the attribute of the same name; the item
/// is created if it does not exist and no condition prevents it.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use ddbcli::{common, write};
/// use indexmap::IndexMap;
/// use serde_json::{Value, json};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let update_item: write::update_item::UpdateItem<Value> = write::update_item::UpdateItem {
///     keys: common::key::Keys {
///         partition_key: common::key::Key {
///             name: "id".to_string(),
///             value: json!("1"),
///         },
///         ..Default::default()
///     },
///     updates: IndexMap::from([("name".to_string(), json!("New"))]),
///     condition: Some("count > 5".parse()?),
///     table_name: "users".to_string(),
/// };
/// update_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateItem<T> {
    /// The primary key of the item to update.
    pub keys: common::key::Keys<T>,
    /// Attribute replacements, applied in order.
    pub updates: IndexMap<String, T>,
    /// Condition that must hold on the current item for the update to apply.
    pub condition: Option<common::condition::KeyCondition<T>>,
    /// The name of the table to write to.
    pub table_name: String,
}

impl<T: Serialize> TryFrom<UpdateItem<T>> for UpdateItemInput {
    type Error = Error;

    fn try_from(update_item: UpdateItem<T>) -> Result<Self> {
        let keys = update_item.keys.try_into()?;
        let (condition_expression, mut expression_attribute_names, mut expression_attribute_values) =
            match update_item.condition {
                Some(condition) => {
                    let condition_operation: common::ExpressionInput = condition.try_into()?;
                    (
                        Some(condition_operation.expression),
                        Some(condition_operation.expression_attribute_names),
                        Some(condition_operation.expression_attribute_values),
                    )
                }
                None => (None, None, None),
            };
        let update_expression = get_set_expression(update_item.updates)?.merge_into(
            &mut expression_attribute_names,
            &mut expression_attribute_values,
        );
        let operation = Self {
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            keys,
            table_name: update_item.table_name,
            update_expression,
        };
        Ok(operation)
    }
}

impl<T: Serialize> UpdateItem<T> {
    /// Render the expressions and prepare the request without sending it.
    pub fn build(
        self,
        client: &Client,
    ) -> Result<operation::update_item::builders::UpdateItemFluentBuilder> {
        let update_item: UpdateItemInput = self.try_into()?;
        let builder = client
            .update_item()
            .set_condition_expression(update_item.condition_expression)
            .set_expression_attribute_names(update_item.expression_attribute_names)
            .set_expression_attribute_values(update_item.expression_attribute_values)
            .set_key(Some(update_item.keys))
            .table_name(update_item.table_name)
            .update_expression(update_item.update_expression);
        Ok(builder)
    }

    /// Execute the update item operation.
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::update_item::UpdateItemOutput,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        self.build(client)
            .map_err(error::BuildError::other)?
            .send()
            .await
    }
}
