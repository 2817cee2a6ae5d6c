//! Request and response envelope types.
//!
//! A [`ToolRequest`] is created once per inbound call and never mutated; the
//! matching [`ToolResponse`] is produced exactly once and is immutable after
//! construction. Exactly one of `payload`/`error` is present.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// One inbound tool invocation.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// The name of the tool being invoked.
    pub tool_name: String,

    /// Raw arguments as supplied by the host, unvalidated.
    pub arguments: Map<String, Value>,

    /// Opaque process-unique token correlating request and response.
    pub request_id: String,
}

impl ToolRequest {
    /// Create a request with a freshly minted request id.
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        let seq = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            tool_name: tool_name.into(),
            arguments,
            request_id: format!("req-{seq}"),
        }
    }
}

/// The closed set of error kinds surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An argument failed a declared constraint; nothing was executed.
    InvalidArgument,
    /// Admission timed out: too many in-flight calls or rate spacing.
    Throttled,
    /// The upstream authenticator rejected or could not issue a session.
    Unauthenticated,
    /// The collaborator call exceeded its per-call deadline.
    Timeout,
    /// The collaborator reported a failure of its own.
    UpstreamError,
    /// The collaborator answered with data that cannot be interpreted.
    MalformedUpstreamData,
    /// An unexpected fault inside the gateway; details are logged, the
    /// message surfaced to the host is sanitized.
    InternalError,
}

/// Error half of the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub message: String,
}

/// The fixed response envelope returned for every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the invocation succeeded.
    pub success: bool,

    /// Request this response answers.
    pub request_id: String,

    /// Present exactly when `success` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Present exactly when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ToolResponse {
    /// Build a success envelope.
    pub fn ok(request: &ToolRequest, payload: Value) -> Self {
        Self {
            success: true,
            request_id: request.request_id.clone(),
            payload: Some(payload),
            error: None,
        }
    }

    /// Build a failure envelope.
    pub fn fail(request: &ToolRequest, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: request.request_id.clone(),
            payload: None,
            error: Some(ResponseError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// The error kind, if this is a failure envelope.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
