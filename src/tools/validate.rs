//! Schema and payload validation.
//!
//! Two layers, mirroring registration time vs call time:
//! - [`validate_registration_schema`] rejects a malformed descriptor when the
//!   registry is built, so schema defects surface at startup.
//! - [`validate_payload`] checks an incoming payload against a descriptor's
//!   schema and applies declared defaults before marshaling.

use serde_json::{Map, Value};

use crate::error::ToolError;

/// Validate a descriptor's input schema at registration time.
pub fn validate_registration_schema(schema: &Value, tool: &str) -> Result<(), ToolError> {
    let errors = check_object_schema(schema, tool);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ToolError::InvalidSchema {
            tool: tool.to_string(),
            errors: errors.join("; "),
        })
    }
}

/// Recursively validate an object-typed schema node.
///
/// Rules enforced:
/// 1. The node must declare `"type": "object"` and carry `"properties"`.
/// 2. Every key in `"required"` must exist in `"properties"`.
/// 3. `"enum"` values must match the property's declared type.
/// 4. Array properties must carry an `"items"` definition.
/// 5. Nested objects follow the same rules.
fn check_object_schema(schema: &Value, path: &str) -> Vec<String> {
    let mut errors = Vec::new();

    match schema.get("type").and_then(Value::as_str) {
        Some("object") => {}
        Some(other) => {
            errors.push(format!("{path}: expected type \"object\", got \"{other}\""));
            return errors;
        }
        None => {
            errors.push(format!("{path}: missing \"type\": \"object\""));
            return errors;
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        errors.push(format!("{path}: missing or non-object \"properties\""));
        return errors;
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for req in required {
            if let Some(key) = req.as_str()
                && !properties.contains_key(key)
            {
                errors.push(format!(
                    "{path}: required key \"{key}\" not found in properties"
                ));
            }
        }
    }

    for (key, prop) in properties {
        let prop_path = format!("{path}.{key}");
        let Some(prop_type) = prop.get("type").and_then(Value::as_str) else {
            // Untyped properties are tolerated; the runtime check skips them.
            continue;
        };

        if let Some(enum_values) = prop.get("enum").and_then(Value::as_array) {
            for (i, val) in enum_values.iter().enumerate() {
                if !type_matches(prop_type, val) {
                    errors.push(format!(
                        "{prop_path}: enum[{i}] value {val} does not match declared type \"{prop_type}\""
                    ));
                }
            }
        }

        match prop_type {
            "object" => errors.extend(check_object_schema(prop, &prop_path)),
            "array" => {
                if let Some(items) = prop.get("items") {
                    if items.get("type").and_then(Value::as_str) == Some("object") {
                        errors.extend(check_object_schema(items, &format!("{prop_path}.items")));
                    }
                } else {
                    errors.push(format!("{prop_path}: array property missing \"items\""));
                }
            }
            _ => {}
        }
    }

    errors
}

/// Validate a payload against a tool's input schema.
///
/// Missing required fields fail with [`ToolError::MissingField`]; type and
/// enumeration violations fail with [`ToolError::InvalidValue`]. Declared
/// defaults are inserted for absent optional fields. Fields the schema does
/// not declare are passed through untouched, matching the external tool's own
/// tolerance.
pub fn validate_payload(
    tool: &str,
    schema: &Value,
    payload: &Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !payload.contains_key(field) {
                return Err(ToolError::MissingField {
                    tool: tool.to_string(),
                    field: field.to_string(),
                });
            }
        }
    }

    let mut validated = payload.clone();

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, prop) in properties {
            match validated.get(field) {
                Some(value) => {
                    if let Some(declared) = prop.get("type").and_then(Value::as_str)
                        && !type_matches(declared, value)
                    {
                        return Err(ToolError::InvalidValue {
                            tool: tool.to_string(),
                            field: field.clone(),
                            reason: format!("expected {declared}, got {value}"),
                        });
                    }
                    if let Some(allowed) = prop.get("enum").and_then(Value::as_array)
                        && !allowed.contains(value)
                    {
                        return Err(ToolError::InvalidValue {
                            tool: tool.to_string(),
                            field: field.clone(),
                            reason: format!(
                                "{value} is not one of {}",
                                Value::Array(allowed.clone())
                            ),
                        });
                    }
                }
                None => {
                    if let Some(default) = prop.get("default") {
                        validated.insert(field.clone(), default.clone());
                    }
                }
            }
        }
    }

    Ok(validated)
}

fn type_matches(declared: &str, value: &Value) -> bool {
    match declared {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    // ── registration-time schema checks ─────────────────────────────────

    #[test]
    fn valid_schema_passes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "A name" }
            },
            "required": ["name"]
        });
        assert!(validate_registration_schema(&schema, "test").is_ok());
    }

    #[test]
    fn missing_object_type_fails() {
        let schema = json!({ "properties": { "name": { "type": "string" } } });
        let err = validate_registration_schema(&schema, "test").unwrap_err();
        assert!(err.to_string().contains("missing \"type\""));
    }

    #[test]
    fn required_key_not_in_properties_fails() {
        let schema = json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name", "age"]
        });
        let err = validate_registration_schema(&schema, "test").unwrap_err();
        assert!(err.to_string().contains("\"age\""));
    }

    #[test]
    fn enum_type_mismatch_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "enum": ["fast", 42] }
            }
        });
        let err = validate_registration_schema(&schema, "test").unwrap_err();
        assert!(err.to_string().contains("enum[1]"));
    }

    #[test]
    fn array_without_items_fails() {
        let schema = json!({
            "type": "object",
            "properties": { "tags": { "type": "array" } }
        });
        let err = validate_registration_schema(&schema, "test").unwrap_err();
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn nested_object_is_validated() {
        let schema = json!({
            "type": "object",
            "properties": {
                "config": {
                    "type": "object",
                    "properties": { "key": { "type": "string" } },
                    "required": ["key", "ghost"]
                }
            }
        });
        let err = validate_registration_schema(&schema, "test").unwrap_err();
        assert!(err.to_string().contains("\"ghost\""));
    }

    // ── call-time payload checks ────────────────────────────────────────

    fn search_like_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "scope": { "type": "string", "enum": ["project", "all"] },
                "query": { "type": "string" },
                "context": { "type": "integer", "default": 2 },
                "caseSensitive": { "type": "boolean", "default": false }
            },
            "required": ["scope", "query"]
        })
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = validate_payload("t", &search_like_schema(), &payload(json!({"scope": "all"})))
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "query"));
    }

    #[test]
    fn wrong_type_is_invalid_value() {
        let err = validate_payload(
            "t",
            &search_like_schema(),
            &payload(json!({"scope": "all", "query": 7})),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidValue { ref field, .. } if field == "query"));
    }

    #[test]
    fn enum_violation_is_invalid_value() {
        let err = validate_payload(
            "t",
            &search_like_schema(),
            &payload(json!({"scope": "everything", "query": "x"})),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidValue { ref field, .. } if field == "scope"));
    }

    #[test]
    fn defaults_are_applied_for_absent_fields() {
        let validated = validate_payload(
            "t",
            &search_like_schema(),
            &payload(json!({"scope": "all", "query": "x"})),
        )
        .unwrap();
        assert_eq!(validated["context"], json!(2));
        assert_eq!(validated["caseSensitive"], json!(false));
    }

    #[test]
    fn provided_values_are_not_overwritten_by_defaults() {
        let validated = validate_payload(
            "t",
            &search_like_schema(),
            &payload(json!({"scope": "all", "query": "x", "context": 9})),
        )
        .unwrap();
        assert_eq!(validated["context"], json!(9));
    }

    #[test]
    fn undeclared_fields_pass_through() {
        let validated = validate_payload(
            "t",
            &search_like_schema(),
            &payload(json!({"scope": "all", "query": "x", "extra": "ignored"})),
        )
        .unwrap();
        assert_eq!(validated["extra"], json!("ignored"));
    }
}
