//! Response normalization.
//!
//! Upstream services answer in whatever shape they like; the host always
//! sees the same record layout. Normalization is total over structurally
//! plausible input: unknown fields are ignored, missing fields are
//! defaulted, and only input with no recognizable record sequence at all is
//! an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keys probed, in order, when the upstream answers with an object instead
/// of a bare array.
const SEQUENCE_KEYS: [&str; 2] = ["resources", "results"];

/// The raw result cannot be interpreted as a resource sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream data is not a resource sequence: {0}")]
pub struct NormalizeError(pub String);

/// One resource record in the fixed envelope shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Map a raw upstream result into the fixed record sequence.
///
/// Accepts a bare JSON array or an object carrying one under a known key.
/// Array entries that are not objects are dropped. Normalizing the
/// serialized output again yields the same records.
pub fn normalize(raw: &Value) -> Result<Vec<ResourceRecord>, NormalizeError> {
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Object(map) => SEQUENCE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| {
                NormalizeError(format!(
                    "object has none of the expected keys {SEQUENCE_KEYS:?}"
                ))
            })?,
        other => {
            return Err(NormalizeError(format!(
                "expected an array or object, got {}",
                json_type_name(other)
            )));
        }
    };

    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_record)
        .collect())
}

fn normalize_record(entry: &serde_json::Map<String, Value>) -> ResourceRecord {
    ResourceRecord {
        id: string_or_default(entry.get("id"), ""),
        name: string_or_default(entry.get("name"), ""),
        description: string_or_default(entry.get("description"), ""),
        kind: string_or_default(entry.get("type"), "unknown"),
        created_date: optional_string(entry.get("created_date")),
        owner: optional_string(entry.get("owner")),
        tags: entry
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        url: optional_string(entry.get("url")),
    }
}

/// Strings pass through; numbers are rendered (upstreams disagree on id
/// types); anything else falls back to the default.
fn string_or_default(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_record() {
        let raw = json!([{
            "id": "resource_1",
            "name": "Quarterly Report",
            "description": "Q3 sales figures",
            "type": "document",
            "created_date": "2024-01-15",
            "owner": "user_1@example.com",
            "tags": ["sales", "q3"],
            "url": "https://service.example.com/resource_1"
        }]);

        let records = normalize(&raw).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "resource_1");
        assert_eq!(record.kind, "document");
        assert_eq!(record.tags, vec!["sales", "q3"]);
        assert_eq!(record.owner.as_deref(), Some("user_1@example.com"));
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let raw = json!([{"name": "Untyped"}]);
        let records = normalize(&raw).unwrap();
        let record = &records[0];
        assert_eq!(record.id, "");
        assert_eq!(record.kind, "unknown");
        assert!(record.tags.is_empty());
        assert!(record.url.is_none());
        assert!(record.created_date.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = json!([{"id": "r1", "relevance_score": 0.93, "shard": 4}]);
        let records = normalize(&raw).unwrap();
        assert_eq!(records[0].id, "r1");
    }

    #[test]
    fn test_numeric_id_rendered() {
        let raw = json!([{"id": 17, "name": "n"}]);
        let records = normalize(&raw).unwrap();
        assert_eq!(records[0].id, "17");
    }

    #[test]
    fn test_object_with_resources_key() {
        let raw = json!({"resources": [{"id": "a"}], "total": 1});
        let records = normalize(&raw).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_object_with_results_key() {
        let raw = json!({"results": [{"id": "a"}, {"id": "b"}]});
        let records = normalize(&raw).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_non_object_entries_dropped() {
        let raw = json!([{"id": "a"}, "stray", 42, {"id": "b"}]);
        let records = normalize(&raw).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_non_sequence_is_error() {
        assert!(normalize(&json!("not a list")).is_err());
        assert!(normalize(&json!(5)).is_err());
        assert!(normalize(&json!({"data": {"nested": true}})).is_err());
    }

    #[test]
    fn test_empty_sequence_ok() {
        assert_eq!(normalize(&json!([])).unwrap().len(), 0);
        assert_eq!(normalize(&json!({"resources": []})).unwrap().len(), 0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!([
            {"id": 1, "name": "First", "tags": ["a", 7, "b"], "extra": true},
            {"description": "no id"},
        ]);

        let once = normalize(&raw).unwrap();
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = normalize(&reserialized).unwrap();

        assert_eq!(once, twice);
    }
}
