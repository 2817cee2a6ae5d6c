//! Input validation for tool invocations.
//!
//! Validation is pure: no I/O, no side effects, deterministic given the
//! arguments. It runs before any credential or admission work and fails fast
//! on the first violated constraint.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domains::tools::definitions::SearchResourcesTool;

/// Default number of results when the host omits `limit`.
pub const DEFAULT_RESULT_LIMIT: u64 = 10;

/// Upper bound on `limit`.
pub const MAX_RESULT_LIMIT: u64 = 100;

/// A constraint violation, reported for the first failing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validated arguments for the `search_resources` tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResourcesArgs {
    /// The search query, trimmed.
    pub query: String,

    /// Maximum number of results, within [1, 100].
    pub limit: u64,
}

/// A tool invocation whose arguments passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCall {
    SearchResources(SearchResourcesArgs),
}

impl ValidatedCall {
    /// The operation name passed to the business-logic collaborator.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::SearchResources(_) => SearchResourcesTool::NAME,
        }
    }
}

/// Validate the arguments for a named tool.
///
/// Unknown tool names fail on the `tool_name` field: the host sees the
/// declared tool list up front, so an unknown name is a malformed request.
pub fn validate(
    tool_name: &str,
    arguments: &Map<String, Value>,
) -> Result<ValidatedCall, ValidationError> {
    match tool_name {
        SearchResourcesTool::NAME => validate_search_resources(arguments),
        other => Err(ValidationError::new(
            "tool_name",
            format!("unknown tool '{other}'"),
        )),
    }
}

fn validate_search_resources(
    arguments: &Map<String, Value>,
) -> Result<ValidatedCall, ValidationError> {
    let query = match arguments.get("query") {
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(ValidationError::new("query", "must be a string")),
        None => return Err(ValidationError::new("query", "is required")),
    };
    if query.is_empty() {
        return Err(ValidationError::new(
            "query",
            "must not be empty or whitespace-only",
        ));
    }

    let limit = match arguments.get("limit") {
        None | Some(Value::Null) => DEFAULT_RESULT_LIMIT,
        Some(value) => match value.as_u64() {
            Some(n) if (1..=MAX_RESULT_LIMIT).contains(&n) => n,
            Some(n) => {
                return Err(ValidationError::new(
                    "limit",
                    format!("must be between 1 and {MAX_RESULT_LIMIT}, got {n}"),
                ));
            }
            None => {
                return Err(ValidationError::new(
                    "limit",
                    format!("must be an integer between 1 and {MAX_RESULT_LIMIT}"),
                ));
            }
        },
    };

    Ok(ValidatedCall::SearchResources(SearchResourcesArgs {
        query: query.to_string(),
        limit,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_arguments() {
        let call = validate(
            "search_resources",
            &args(json!({"query": "sales reports", "limit": 5})),
        )
        .unwrap();
        let ValidatedCall::SearchResources(parsed) = call;
        assert_eq!(parsed.query, "sales reports");
        assert_eq!(parsed.limit, 5);
    }

    #[test]
    fn test_limit_defaults_when_absent() {
        let call = validate("search_resources", &args(json!({"query": "reports"}))).unwrap();
        let ValidatedCall::SearchResources(parsed) = call;
        assert_eq!(parsed.limit, DEFAULT_RESULT_LIMIT);
    }

    #[test]
    fn test_query_is_trimmed() {
        let call = validate("search_resources", &args(json!({"query": "  data  "}))).unwrap();
        let ValidatedCall::SearchResources(parsed) = call;
        assert_eq!(parsed.query, "data");
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = validate("search_resources", &args(json!({"query": ""}))).unwrap_err();
        assert_eq!(err.field, "query");
    }

    #[test]
    fn test_whitespace_query_rejected() {
        let err = validate("search_resources", &args(json!({"query": "   "}))).unwrap_err();
        assert_eq!(err.field, "query");
    }

    #[test]
    fn test_missing_query_rejected() {
        let err = validate("search_resources", &args(json!({"limit": 5}))).unwrap_err();
        assert_eq!(err.field, "query");
        assert!(err.reason.contains("required"));
    }

    #[test]
    fn test_non_string_query_rejected() {
        let err = validate("search_resources", &args(json!({"query": 42}))).unwrap_err();
        assert_eq!(err.field, "query");
    }

    #[test]
    fn test_limit_out_of_range_rejected() {
        for bad in [0, 101, 150] {
            let err = validate(
                "search_resources",
                &args(json!({"query": "reports", "limit": bad})),
            )
            .unwrap_err();
            assert_eq!(err.field, "limit", "limit {bad} should be rejected");
        }
    }

    #[test]
    fn test_limit_bounds_accepted() {
        for good in [1, 100] {
            let call = validate(
                "search_resources",
                &args(json!({"query": "reports", "limit": good})),
            )
            .unwrap();
            let ValidatedCall::SearchResources(parsed) = call;
            assert_eq!(parsed.limit, good);
        }
    }

    #[test]
    fn test_negative_or_fractional_limit_rejected() {
        let err = validate(
            "search_resources",
            &args(json!({"query": "reports", "limit": -3})),
        )
        .unwrap_err();
        assert_eq!(err.field, "limit");

        let err = validate(
            "search_resources",
            &args(json!({"query": "reports", "limit": 2.5})),
        )
        .unwrap_err();
        assert_eq!(err.field, "limit");
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let err = validate("delete_everything", &Map::new()).unwrap_err();
        assert_eq!(err.field, "tool_name");
        assert!(err.reason.contains("delete_everything"));
    }
}
