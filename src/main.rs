//! MCP Server Entry Point
//!
//! This is the main entry point for the gateway MCP server. It loads
//! configuration, initializes logging, wires the dispatcher to its upstream
//! collaborators, and starts the server with the configured transport.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use gateway_mcp_server::core::{Config, McpServer, TransportService};
use gateway_mcp_server::gateway::{Dispatcher, HttpAuthenticator, HttpBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment; missing required options abort
    // startup with a descriptive error before any I/O happens.
    let config = Config::from_env()?;

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    // Wire the dispatcher to its HTTP collaborators.
    let authenticator = Arc::new(HttpAuthenticator::new(&config)?);
    let backend = Arc::new(HttpBackend::new(&config)?);
    let dispatcher = Arc::new(Dispatcher::new(&config, authenticator, backend));

    let server = McpServer::new(config.clone(), dispatcher);

    info!("Server initialized");

    // Create and run the transport service
    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr: stdout belongs to the STDIO transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
