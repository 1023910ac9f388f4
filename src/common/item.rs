use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Result, to_item};
use serde_json::{Map, Number, Value};
use std::collections;

/// A record as read from or written to a table.
pub type Item = Map<String, Value>;

/// A record in DynamoDB attribute-value form.
pub type AttributeMap = collections::HashMap<String, types::AttributeValue>;

/// Convert a record into DynamoDB attribute values.
///
/// Fails when `item` does not serialize to a map.
pub fn to_attribute_map<T: Serialize>(item: T) -> Result<AttributeMap> {
    to_item(item)
}

/// Convert DynamoDB attribute values into a JSON record.
///
/// Binary values have no JSON form and are coerced to their (lossy) UTF-8
/// string representation; numbers JSON cannot represent are kept as strings.
pub fn from_attribute_map(item: AttributeMap) -> Item {
    item.into_iter()
        .map(|(name, value)| (name, from_attribute_value(value)))
        .collect()
}

fn from_number(number: String) -> Value {
    match number.parse::<Number>() {
        Ok(parsed) => Value::Number(parsed),
        Err(_) => Value::String(number),
    }
}

fn from_attribute_value(value: types::AttributeValue) -> Value {
    match value {
        types::AttributeValue::S(string) => Value::String(string),
        types::AttributeValue::N(number) => from_number(number),
        types::AttributeValue::Bool(boolean) => Value::Bool(boolean),
        types::AttributeValue::Null(_) => Value::Null,
        types::AttributeValue::L(list) => {
            Value::Array(list.into_iter().map(from_attribute_value).collect())
        }
        types::AttributeValue::M(map) => Value::Object(from_attribute_map(map)),
        types::AttributeValue::Ss(strings) => {
            Value::Array(strings.into_iter().map(Value::String).collect())
        }
        types::AttributeValue::Ns(numbers) => {
            Value::Array(numbers.into_iter().map(from_number).collect())
        }
        types::AttributeValue::B(blob) => {
            Value::String(String::from_utf8_lossy(blob.as_ref()).into_owned())
        }
        types::AttributeValue::Bs(blobs) => Value::Array(
            blobs
                .into_iter()
                .map(|blob| Value::String(String::from_utf8_lossy(blob.as_ref()).into_owned()))
                .collect(),
        ),
        other => Value::String(format!("{other:?}")),
    }
}
