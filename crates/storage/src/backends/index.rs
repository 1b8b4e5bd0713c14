//! Index term extraction shared by the large-tier backends.

use serde_json::Value;

/// Field at the dotted `key_path` of `record`.
pub(crate) fn lookup<'a>(record: &'a Value, key_path: &str) -> Option<&'a Value> {
    key_path
        .split('.')
        .try_fold(record, |value, segment| value.get(segment))
}

/// Normalized form of an indexed value. Null and missing fields are not indexed.
pub(crate) fn term(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Index term of `record` for the field at `key_path`.
pub(crate) fn record_term(record: &Value, key_path: &str) -> Option<String> {
    lookup(record, key_path).and_then(term)
}
