//! Schema validation helpers for ragloop JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "agent", "context", "history"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("agent") {
        validate_agent(value, layer, "agent")?;
    }
    if let Some(value) = map.get("context") {
        validate_context(value, layer, "context")?;
    }
    if let Some(value) = map.get("history") {
        validate_history(value, layer, "history")?;
    }
    Ok(())
}

/// Validate the "agent" block.
fn validate_agent(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "top_k",
            "similarity_threshold",
            "max_turns",
            "web_search_enabled",
            "web_max_results",
            "stage_timeout_ms",
        ],
        layer,
        path,
    )?;

    for key in ["top_k", "max_turns", "web_max_results"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("similarity_threshold") {
        expect_f64(value, layer, &join_path(path, "similarity_threshold"))?;
    }
    if let Some(value) = map.get("web_search_enabled") {
        expect_bool(value, layer, &join_path(path, "web_search_enabled"))?;
    }
    if let Some(value) = map.get("stage_timeout_ms").filter(|value| !value.is_null()) {
        expect_u64(value, layer, &join_path(path, "stage_timeout_ms"))?;
    }
    Ok(())
}

/// Validate the "context" block.
fn validate_context(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["budget_chars", "instructions", "history_pairs"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("budget_chars") {
        expect_u64(value, layer, &join_path(path, "budget_chars"))?;
    }
    if let Some(value) = map.get("instructions").filter(|value| !value.is_null()) {
        expect_string(value, layer, &join_path(path, "instructions"))?;
    }
    if let Some(value) = map.get("history_pairs").filter(|value| !value.is_null()) {
        expect_u64(value, layer, &join_path(path, "history_pairs"))?;
    }
    Ok(())
}

/// Validate the "history" block.
fn validate_history(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["persist", "path", "name", "capture"], layer, path)?;

    if let Some(value) = map.get("persist") {
        expect_bool(value, layer, &join_path(path, "persist"))?;
    }
    if let Some(value) = map.get("path").filter(|value| !value.is_null()) {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("name") {
        expect_string(value, layer, &join_path(path, "name"))?;
    }
    if let Some(value) = map.get("capture") {
        validate_capture(value, layer, &join_path(path, "capture"))?;
    }
    Ok(())
}

/// Validate history capture settings.
fn validate_capture(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "redact_patterns",
            "detect_secrets",
            "secret_entropy_threshold",
            "max_message_chars",
        ],
        layer,
        path,
    )?;

    if let Some(value) = map.get("redact_patterns") {
        validate_string_array(value, layer, &join_path(path, "redact_patterns"))?;
    }
    if let Some(value) = map.get("detect_secrets") {
        expect_bool(value, layer, &join_path(path, "detect_secrets"))?;
    }
    if let Some(value) = map.get("secret_entropy_threshold") {
        expect_f64(value, layer, &join_path(path, "secret_entropy_threshold"))?;
    }
    if let Some(value) = map.get("max_message_chars").filter(|value| !value.is_null()) {
        expect_u64(value, layer, &join_path(path, "max_message_chars"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Expect a non-negative JSON integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Expect a JSON number.
fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
