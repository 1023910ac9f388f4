use crate::{Error, common};

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Result, to_attribute_value};
use serde_json::Value;
use std::{collections, str};

/// Identifier used for the attribute-name placeholder and value placeholders.
const PLACEHOLDER: &str = "condition";

/// Condition types for DynamoDB condition expressions.
///
/// ```rust
/// use ddbcli::common::condition;
///
/// let eq = condition::Condition::Equals("value".to_string());
/// let gt = condition::Condition::GreaterThan(100);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// Checks if an attribute begins with a specified prefix (string types only).
    BeginsWith(String),
    /// Checks if an attribute value is between two values (inclusive).
    Between(T, T),
    /// Checks if an attribute contains a specified value.
    Contains(T),
    /// Checks if an attribute value equals a specified value.
    Equals(T),
    /// Checks if an attribute value is greater than a specified value.
    GreaterThan(T),
    /// Checks if an attribute value is greater than or equal to a specified value.
    GreaterThanOrEqual(T),
    /// Checks if an attribute value is in a list of specified values.
    In(Vec<T>),
    /// Checks if an attribute value is less than a specified value.
    LessThan(T),
    /// Checks if an attribute value is less than or equal to a specified value.
    LessThanOrEqual(T),
    /// Checks if an attribute value does not equal a specified value.
    NotEqual(T),
}

impl<T: Serialize> Condition<T> {
    fn get_expression(
        self,
        key: &str,
        key_placeholder: &str,
        index: &mut usize,
    ) -> Result<(String, collections::HashMap<String, types::AttributeValue>)> {
        let mut expression_attribute_values = collections::HashMap::new();
        let expression = match self {
            Self::BeginsWith(prefix) => {
                let value_placeholder = format!(":{key}_begins_with{index}");
                *index += 1;
                let expression = format!("begins_with({key_placeholder}, {value_placeholder})");
                expression_attribute_values
                    .insert(value_placeholder, types::AttributeValue::S(prefix));
                expression
            }
            Self::Between(value1, value2) => {
                let value1 = to_attribute_value(value1)?;
                let value2 = to_attribute_value(value2)?;
                let value_placeholder_1 = format!(":{key}_between{index}");
                *index += 1;
                let value_placeholder_2 = format!(":{key}_between{index}");
                *index += 1;
                let expression = format!(
                    "{key_placeholder} BETWEEN {value_placeholder_1} AND {value_placeholder_2}"
                );
                expression_attribute_values.insert(value_placeholder_1, value1);
                expression_attribute_values.insert(value_placeholder_2, value2);
                expression
            }
            Self::Contains(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_contains{index}");
                *index += 1;
                let expression = format!("contains({key_placeholder}, {value_placeholder})");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::In(values) => {
                let mut placeholders = Vec::with_capacity(values.len());
                for (in_index, value) in values.into_iter().enumerate() {
                    let value = to_attribute_value(value)?;
                    let placeholder = format!(":{key}_in{index}_{in_index}");
                    *index += 1;
                    expression_attribute_values.insert(placeholder.clone(), value);
                    placeholders.push(placeholder);
                }
                let placeholders = placeholders.join(", ");
                format!("{key_placeholder} IN ({placeholders})")
            }
            Self::Equals(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_eq{index}");
                *index += 1;
                let expression = format!("{key_placeholder} = {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::GreaterThan(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_gt{index}");
                *index += 1;
                let expression = format!("{key_placeholder} > {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::GreaterThanOrEqual(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_gte{index}");
                *index += 1;
                let expression = format!("{key_placeholder} >= {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::LessThan(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_lt{index}");
                *index += 1;
                let expression = format!("{key_placeholder} < {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::LessThanOrEqual(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_lte{index}");
                *index += 1;
                let expression = format!("{key_placeholder} <= {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
            Self::NotEqual(value) => {
                let value = to_attribute_value(value)?;
                let value_placeholder = format!(":{key}_ne{index}");
                *index += 1;
                let expression = format!("{key_placeholder} <> {value_placeholder}");
                expression_attribute_values.insert(value_placeholder, value);
                expression
            }
        };
        Ok((expression, expression_attribute_values))
    }
}

impl Condition<Value> {
    /// Build a condition from an operator token and its JSON operand.
    ///
    /// Both the symbolic operators (`=`, `<>`, `<`, ...) and their word forms
    /// (`eq`, `ne`, `lt`, ...) are accepted.
    pub fn parse(operator: &str, value: Value) -> crate::Result<Self> {
        let condition = match operator {
            "=" | "==" | "eq" => Self::Equals(value),
            "<>" | "!=" | "ne" => Self::NotEqual(value),
            "<" | "lt" => Self::LessThan(value),
            "<=" | "lte" => Self::LessThanOrEqual(value),
            ">" | "gt" => Self::GreaterThan(value),
            ">=" | "gte" => Self::GreaterThanOrEqual(value),
            "contains" => Self::Contains(value),
            "begins_with" => match value {
                Value::String(prefix) => Self::BeginsWith(prefix),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "begins_with expects a string, got {other}"
                    )));
                }
            },
            "between" => match value {
                Value::Array(bounds) => match <[Value; 2]>::try_from(bounds) {
                    Ok([low, high]) => Self::Between(low, high),
                    Err(bounds) => {
                        return Err(Error::InvalidArgument(format!(
                            "between expects a two-element array, got {}",
                            Value::Array(bounds)
                        )));
                    }
                },
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "between expects a two-element array, got {other}"
                    )));
                }
            },
            "in" => match value {
                Value::Array(values) if !values.is_empty() => Self::In(values),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "in expects a non-empty array, got {other}"
                    )));
                }
            },
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown condition operator {other:?}"
                )));
            }
        };
        Ok(condition)
    }
}

/// Condition applied to an attribute.
///
/// On the command line it is written as `<attribute> <operator> <value>`,
/// where `<value>` is JSON:
///
/// ```rust
/// use ddbcli::common::condition;
///
/// let condition: condition::KeyCondition<serde_json::Value> = "count > 5".parse().unwrap();
/// assert_eq!(condition.name, "count");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KeyCondition<T> {
    /// The condition to apply to the attribute.
    pub condition: Condition<T>,
    /// The name of the attribute to apply the condition to.
    pub name: String,
}

impl<T: Serialize> TryFrom<KeyCondition<T>> for common::ExpressionInput {
    type Error = serde_dynamo::Error;

    fn try_from(key_condition: KeyCondition<T>) -> Result<Self> {
        let key_placeholder = format!("#{PLACEHOLDER}");
        let (expression, expression_attribute_values) =
            key_condition
                .condition
                .get_expression(PLACEHOLDER, &key_placeholder, &mut 0)?;
        let expression_attribute_names =
            collections::HashMap::from([(key_placeholder, key_condition.name)]);
        let operation = Self {
            expression,
            expression_attribute_names,
            expression_attribute_values,
        };
        Ok(operation)
    }
}

impl str::FromStr for KeyCondition<Value> {
    type Err = Error;

    fn from_str(condition: &str) -> crate::Result<Self> {
        let mut parts = condition.splitn(3, ' ');
        let (Some(name), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidArgument(format!(
                "condition {condition:?} is not of the form \"<attribute> <operator> <value>\""
            )));
        };
        if name.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "condition {condition:?} names no attribute"
            )));
        }
        let value = serde_json::from_str(value).map_err(|err| {
            Error::InvalidArgument(format!("condition value {value:?} is not valid JSON: {err}"))
        })?;
        let condition = Condition::parse(operator, value)?;
        let key_condition = Self {
            condition,
            name: name.to_string(),
        };
        Ok(key_condition)
    }
}
