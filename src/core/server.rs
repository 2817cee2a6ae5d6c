//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to domain-specific services.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool
//! and routed through a ToolRouter built in `domains/tools/router.rs`. Each
//! route hands its arguments to the shared gateway [`Dispatcher`], so every
//! tool call passes the same validation, admission, and credential pipeline.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::{prompts::PromptService, tools::build_tool_router};
use crate::gateway::Dispatcher;

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and
/// coordinates between the tool router, the gateway dispatcher, and the
/// prompt service.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// The gateway dispatcher shared by all tool routes.
    dispatcher: Arc<Dispatcher>,

    /// Service for handling prompt-related requests.
    prompt_service: Arc<PromptService>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration and dispatcher.
    pub fn new(config: Config, dispatcher: Arc<Dispatcher>) -> Self {
        let config = Arc::new(config);

        let prompt_service = Arc::new(PromptService::new(config.prompts.clone()));

        Self {
            tool_router: build_tool_router::<Self>(Arc::clone(&dispatcher)),
            config,
            dispatcher,
            prompt_service,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the gateway dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Tool-invocation gateway server. Exposes search_resources against a \
                 configured upstream service; see the usage_guide prompt for the response \
                 envelope and error kinds."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        let prompts = self.prompt_service.list_prompts().await;
        Ok(ListPromptsResult {
            prompts,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        // Convert serde_json::Map to HashMap<String, String>
        let arguments = request.arguments.map(|map| {
            map.into_iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                .collect()
        });
        self.prompt_service
            .get_prompt(&request.name, arguments)
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{
        AuthError, Authenticator, Backend, BackendError, IssuedCredential, ValidatedCall,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::Value;

    struct NullAuthenticator;

    #[async_trait]
    impl Authenticator for NullAuthenticator {
        async fn authenticate(&self, _identity: &str) -> Result<IssuedCredential, AuthError> {
            Ok(IssuedCredential {
                token: "test-token".to_string(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
        }
    }

    struct NullBackend;

    #[async_trait]
    impl Backend for NullBackend {
        async fn execute(
            &self,
            _operation: &str,
            _call: &ValidatedCall,
            _token: &str,
        ) -> Result<Value, BackendError> {
            Ok(serde_json::json!([]))
        }
    }

    fn test_server() -> McpServer {
        let config = Config::default();
        let dispatcher = Arc::new(Dispatcher::new(
            &config,
            Arc::new(NullAuthenticator),
            Arc::new(NullBackend),
        ));
        McpServer::new(config, dispatcher)
    }

    #[test]
    fn test_server_identity() {
        let server = test_server();
        assert_eq!(server.name(), "gateway-mcp-server");
        assert!(!server.version().is_empty());
    }

    #[test]
    fn test_server_info_capabilities() {
        let server = test_server();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.instructions.unwrap().contains("search_resources"));
    }
}
