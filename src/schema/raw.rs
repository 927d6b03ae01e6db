//! Readers over generic decoded data (`serde_json::Value`).
//!
//! Rule documents are authored by hand, usually in YAML, so the readers here are
//! lenient about shape: a single string stands in for a one-element list, a flag may
//! be spelled `"true"` or `1`, and an empty value counts as absent.

use serde_json::{Map, Value};

use crate::schema::errors::ValidationError;

pub type Object = Map<String, Value>;

/// Joins a parent path and a child key into a dotted field path.
pub fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// `null`, `false`, `0`, and `""` count as absent.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Looks a field up under its authoring key first, then under its aliases.
/// Returns the key that was found alongside the value.
pub fn lookup<'a>(obj: &'a Object, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|key| obj.get(*key).filter(|v| is_present(v)).map(|v| (*key, v)))
}

pub fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Object, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid(field, "must be an object"))
}

pub fn as_string(value: &Value, field: &str) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::invalid(field, "must be a string"))
}

pub fn require_string(
    obj: &Object,
    path: &str,
    keys: &[&'static str],
) -> Result<String, ValidationError> {
    match lookup(obj, keys) {
        Some((key, value)) => as_string(value, &join(path, key)),
        None => Err(ValidationError::missing(join(path, keys[0]))),
    }
}

pub fn optional_string(
    obj: &Object,
    path: &str,
    keys: &[&'static str],
) -> Result<Option<String>, ValidationError> {
    lookup(obj, keys)
        .map(|(key, value)| as_string(value, &join(path, key)))
        .transpose()
}

/// A single string or an array of strings. Absent yields an empty list.
pub fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>, ValidationError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| as_string(item, &format!("{field}[{i}]")))
            .collect(),
        Some(_) => Err(ValidationError::invalid(
            field,
            "must be either a string or an array of strings",
        )),
    }
}

/// Accepts `true`/`false`, `"true"`/`"false"` and `1`/`0`. Absent is `false`.
pub fn parse_bool(value: Option<&Value>, field: &str) -> Result<bool, ValidationError> {
    let reject = |v: &Value| {
        ValidationError::invalid(
            field,
            format!("allowed values are true/false/1/0, but got {v}"),
        )
    };

    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(v @ Value::String(s)) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(reject(v)),
        },
        Some(v @ Value::Number(n)) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(reject(v)),
        },
        Some(v) => Err(reject(v)),
    }
}

/// Scalar rendered the way it compares against a query-string value.
pub fn scalar_to_string(value: &Value, field: &str) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ValidationError::invalid(
            field,
            "must be a string, number or boolean",
        )),
    }
}
