//! Resource search tool.
//!
//! Searches the configured upstream service for resources matching a query.
//! The route forwards raw arguments to the gateway dispatcher; validation,
//! admission, credentials, and error classification all happen there, and
//! the result is the fixed response envelope rendered as JSON content.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::gateway::{Dispatcher, ToolRequest, ToolResponse};

/// Parameters for the resource search tool.
///
/// This struct exists to declare the input schema; runtime validation is
/// performed by `gateway::validator` against the raw arguments.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchResourcesParams {
    /// The search query used to find resources.
    #[schemars(description = "Search term or phrase (must not be blank)")]
    pub query: String,

    /// Maximum number of results to return.
    #[schemars(description = "Maximum number of results (1-100, default: 10)")]
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Resource search tool implementation.
#[derive(Debug, Clone)]
pub struct SearchResourcesTool;

impl SearchResourcesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_resources";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search for resources in the connected upstream service. \
        Returns a response envelope with matching resource records (id, name, description, type, \
        owner, tags, url) on success, or a typed error (invalid_argument, throttled, \
        unauthenticated, timeout, upstream_error, malformed_upstream_data, internal_error) on \
        failure.";

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SearchResourcesParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute backed by the gateway dispatcher.
    pub fn create_route<S>(dispatcher: Arc<Dispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let dispatcher = Arc::clone(&dispatcher);
            let arguments = ctx.arguments.clone().unwrap_or_default();
            async move {
                let request = ToolRequest::new(Self::NAME, arguments);
                let response = dispatcher.invoke(request).await;
                to_call_result(&response)
            }
            .boxed()
        })
    }
}

/// Render the response envelope as MCP tool content.
///
/// The envelope itself is the contract: it is returned verbatim as JSON for
/// both outcomes, with the MCP error flag mirroring `success`.
fn to_call_result(response: &ToolResponse) -> Result<CallToolResult, McpError> {
    let body = serde_json::to_string_pretty(response)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;

    if response.success {
        Ok(CallToolResult::success(vec![Content::text(body)]))
    } else {
        Ok(CallToolResult::error(vec![Content::text(body)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ErrorKind;
    use serde_json::Map;

    #[test]
    fn test_params_limit_optional() {
        let json = r#"{"query": "sales reports"}"#;
        let params: SearchResourcesParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.query, "sales reports");
        assert_eq!(params.limit, None);
    }

    #[test]
    fn test_params_with_limit() {
        let json = r#"{"query": "sales reports", "limit": 5}"#;
        let params: SearchResourcesParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn test_to_tool_metadata() {
        let tool = SearchResourcesTool::to_tool();
        assert_eq!(tool.name.as_ref(), "search_resources");
        assert!(tool.description.is_some());
    }

    #[test]
    fn test_success_envelope_renders_as_success() {
        let request = ToolRequest::new(SearchResourcesTool::NAME, Map::new());
        let response = ToolResponse::ok(&request, serde_json::json!({"resources": []}));

        let result = to_call_result(&response).unwrap();
        assert!(!result.is_error.unwrap_or(false));
    }

    #[test]
    fn test_failure_envelope_renders_as_error() {
        let request = ToolRequest::new(SearchResourcesTool::NAME, Map::new());
        let response = ToolResponse::fail(&request, ErrorKind::Throttled, "admission timed out");

        let result = to_call_result(&response).unwrap();
        assert!(result.is_error.unwrap_or(false));
    }
}
