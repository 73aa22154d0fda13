//! Entity service response envelope.
//!
//! Every entity service answers with `{ "data": { "<plural>": [ {..}, .. ] } }`.
//! Failures put their details under `data.errors`. A missing or empty
//! collection means "no results", never an error.

use remodel_model::ERRORS_ATTRIBUTE;
use serde_json::{Map, Value};

/// Rows of the collection named `plural`.
pub fn rows(body: &Value, plural: &str) -> Vec<Map<String, Value>> {
    body.get("data")
        .and_then(|data| data.get(plural))
        .map(collection_rows)
        .unwrap_or_default()
}

/// The first non-error collection in the envelope and its rows.
///
/// Used when a related service names its collection differently from the
/// plural the caller expected.
pub fn first_collection(body: &Value) -> Option<(String, Vec<Map<String, Value>>)> {
    let data = body.get("data")?.as_object()?;
    data.iter()
        .find(|(key, _)| key.as_str() != ERRORS_ATTRIBUTE)
        .map(|(key, value)| (key.clone(), collection_rows(value)))
        .filter(|(_, rows)| !rows.is_empty())
}

/// Rows under `plural`, falling back to the first collection present.
pub fn rows_or_first(body: &Value, plural: &str) -> Option<(String, Vec<Map<String, Value>>)> {
    let named = rows(body, plural);
    if !named.is_empty() {
        return Some((plural.to_string(), named));
    }
    first_collection(body)
}

/// Entries under `data.errors`.
pub fn error_entries(body: &Value) -> Vec<Value> {
    match body.get("data").and_then(|data| data.get(ERRORS_ATTRIBUTE)) {
        Some(Value::Array(entries)) => entries.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

fn collection_rows(value: &Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        Value::Object(row) => vec![row.clone()],
        _ => Vec::new(),
    }
}
