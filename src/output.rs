//! Rendering of command results.

use serde_json::Value;

/// Response field that is never printed.
const RESPONSE_METADATA: &str = "ResponseMetadata";

/// Render a command result as indented JSON.
///
/// Nothing is printed for an absent or `null` result.
pub fn render(result: Option<Value>) -> serde_json::Result<Option<String>> {
    let mut result = match result {
        None | Some(Value::Null) => return Ok(None),
        Some(result) => result,
    };
    if let Value::Object(object) = &mut result {
        object.remove(RESPONSE_METADATA);
    }
    serde_json::to_string_pretty(&result).map(Some)
}
