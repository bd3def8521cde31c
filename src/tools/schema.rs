//! Tool argument validation
//!
//! Validates tool-call arguments against the subset of JSON Schema the tool
//! definitions use: top-level object, required fields, primitive types,
//! string enums, and array item types. Runs before any handler executes so
//! malformed calls are rejected uniformly.

use crate::error::{CiceroneError, Result};
use serde_json::Value;

/// Validates `args` against a tool's parameter schema
///
/// # Arguments
///
/// * `tool` - Tool name, used in error messages
/// * `schema` - The tool's `parameters` schema
/// * `args` - The arguments the model supplied
///
/// # Errors
///
/// Returns `CiceroneError::InvalidArguments` naming the first violation
pub fn validate_args(tool: &str, schema: &Value, args: &Value) -> Result<()> {
    let object = args.as_object().ok_or_else(|| invalid(tool, "arguments must be a JSON object"))?;

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                return Err(invalid(tool, &format!("missing required field '{}'", field)).into());
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, value) in object {
        let Some(property) = properties.get(name) else {
            // Unknown fields are tolerated; models pad arguments freely
            continue;
        };
        check_value(tool, name, property, value)?;
    }

    Ok(())
}

fn check_value(tool: &str, field: &str, property: &Value, value: &Value) -> Result<()> {
    if value.is_null() {
        // Null is treated as "not provided"; required-ness was checked above
        return Ok(());
    }

    if let Some(expected) = property.get("type").and_then(Value::as_str) {
        let ok = match expected {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        };
        if !ok {
            return Err(invalid(
                tool,
                &format!("field '{}' must be of type {}", field, expected),
            )
            .into());
        }
    }

    if let Some(allowed) = property.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            return Err(invalid(
                tool,
                &format!(
                    "field '{}' must be one of [{}], got {}",
                    field,
                    options.join(", "),
                    value
                ),
            )
            .into());
        }
    }

    if let (Some(items), Some(array)) = (property.get("items"), value.as_array()) {
        for (index, item) in array.iter().enumerate() {
            check_value(tool, &format!("{}[{}]", field, index), items, item)?;
        }
    }

    Ok(())
}

fn invalid(tool: &str, message: &str) -> CiceroneError {
    CiceroneError::InvalidArguments {
        tool: tool.to_string(),
        message: message.to_string(),
    }
}
