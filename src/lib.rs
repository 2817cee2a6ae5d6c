//! Tool-Invocation Gateway MCP Server
//!
//! This crate exposes a small set of schema-declared tools over the Model
//! Context Protocol and routes every invocation through a gateway core that
//! validates input, caches upstream credentials, bounds concurrency, and
//! converts all failures into a closed response envelope.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   the main server handler, and the transport layer
//! - **gateway**: The invocation pipeline: request/response envelope, input
//!   validator, credential cache, concurrency governor, tool dispatcher,
//!   response normalizer, and the upstream collaborator seam
//! - **domains**: Host-facing surfaces organized by bounded contexts
//!   - **tools**: MCP tools that can be executed by clients
//!   - **prompts**: Prompt templates for consistent interactions
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gateway_mcp_server::core::{Config, McpServer};
//! use gateway_mcp_server::gateway::{Dispatcher, HttpAuthenticator, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let authenticator = Arc::new(HttpAuthenticator::new(&config)?);
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let dispatcher = Arc::new(Dispatcher::new(&config, authenticator, backend));
//!     let server = McpServer::new(config, dispatcher);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;
pub mod gateway;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
pub use gateway::{Dispatcher, ErrorKind, ToolRequest, ToolResponse};
