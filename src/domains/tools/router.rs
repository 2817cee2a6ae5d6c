//! Tool Router - builds the rmcp ToolRouter from the tool definitions.
//!
//! Each tool knows how to create its own route; this module only assembles
//! them. Every route shares one gateway dispatcher so admission and
//! credential state are global across tools.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::SearchResourcesTool;
use crate::gateway::Dispatcher;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(dispatcher: Arc<Dispatcher>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new().with_route(SearchResourcesTool::create_route(dispatcher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::gateway::{
        AuthError, Authenticator, Backend, BackendError, IssuedCredential, ValidatedCall,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::Value;

    struct TestServer {}

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

    fn test_dispatcher() -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(
            &Config::default(),
            Arc::new(NullAuthenticator),
            Arc::new(NullBackend),
        ))
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_dispatcher());
        let tools = router.list_all();
        assert_eq!(tools.len(), 1);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"search_resources"));
    }

    #[test]
    fn test_router_tools_have_schemas() {
        let router: ToolRouter<TestServer> = build_tool_router(test_dispatcher());
        for tool in router.list_all() {
            assert!(tool.description.is_some(), "{} lacks a description", tool.name);
            assert!(!tool.input_schema.is_empty(), "{} lacks a schema", tool.name);
        }
    }
}
