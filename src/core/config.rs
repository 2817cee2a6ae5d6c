//! Configuration management for the gateway server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (with `.env` support) or defaults. The configuration
//! is constructed once at startup and handed to the server by ownership; no
//! ambient global state.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure for the gateway server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Gateway core configuration: upstream endpoint, timeouts, and
    /// admission bounds.
    pub gateway: GatewayConfig,

    /// Upstream credentials used by the authenticator collaborator.
    pub credentials: CredentialsConfig,

    /// Prompts domain configuration.
    pub prompts: PromptsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Configuration for the gateway invocation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the upstream service (auth and search endpoints).
    pub base_url: String,

    /// Per-call deadline for the business-logic collaborator, in ms.
    pub timeout_ms: u64,

    /// Deadline for a single authenticator round-trip, in ms.
    pub auth_timeout_ms: u64,

    /// Maximum number of simultaneous in-flight invocations.
    pub max_concurrent: usize,

    /// How long a call may wait for admission before it is throttled, in ms.
    pub acquire_timeout_ms: u64,

    /// Optional minimum spacing between calls for one backend identity, in
    /// ms. `None` disables rate spacing.
    pub min_interval_ms: Option<u64>,

    /// A cached session is refreshed this many seconds before its actual
    /// expiry so in-flight calls never ride an expiring token.
    pub auth_safety_margin_secs: i64,
}

/// Configuration for the prompts domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    // Prompts are registered in domains/prompts/registry.rs
    // Add prompt-specific configuration here if needed.
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Credentials for the upstream authenticator.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// The backend identity the gateway authenticates as.
    pub identity: String,

    /// The shared secret presented to the authenticator.
    pub secret: String,
}

/// Custom Debug implementation to redact the secret from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("identity", &self.identity)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 30_000,
            auth_timeout_ms: 10_000,
            max_concurrent: 10,
            acquire_timeout_ms: 5_000,
            min_interval_ms: None,
            auth_safety_margin_secs: 30,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        // Demo values for local experimentation and tests; from_env()
        // requires real values and never falls back to these.
        Self {
            identity: "demo".to_string(),
            secret: "demo-secret".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "gateway-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            gateway: GatewayConfig::default(),
            credentials: CredentialsConfig::default(),
            prompts: PromptsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `MCP_`, e.g. `MCP_SERVER_NAME`,
    /// `MCP_GATEWAY_BASE_URL`. The upstream endpoint and credentials are
    /// required and missing values fail startup with a descriptive error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.gateway.base_url = require_env("MCP_GATEWAY_BASE_URL")?;
        config.credentials.identity = require_env("MCP_GATEWAY_IDENTITY")?;
        config.credentials.secret = require_env("MCP_GATEWAY_SECRET")?;

        if let Some(timeout) = parse_env("MCP_GATEWAY_TIMEOUT_MS")? {
            config.gateway.timeout_ms = timeout;
        }

        if let Some(timeout) = parse_env("MCP_GATEWAY_AUTH_TIMEOUT_MS")? {
            config.gateway.auth_timeout_ms = timeout;
        }

        if let Some(max) = parse_env("MCP_GATEWAY_MAX_CONCURRENT")? {
            config.gateway.max_concurrent = max;
        }

        if let Some(timeout) = parse_env("MCP_GATEWAY_ACQUIRE_TIMEOUT_MS")? {
            config.gateway.acquire_timeout_ms = timeout;
        }

        config.gateway.min_interval_ms = parse_env("MCP_GATEWAY_MIN_INTERVAL_MS")?;

        if let Some(margin) = parse_env("MCP_GATEWAY_AUTH_SAFETY_MARGIN_SECS")? {
            config.gateway.auth_safety_margin_secs = margin;
        }

        if config.gateway.max_concurrent == 0 {
            return Err(Error::config("MCP_GATEWAY_MAX_CONCURRENT must be at least 1"));
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        info!(
            "Gateway configured for {} (identity: {})",
            config.gateway.base_url, config.credentials.identity
        );

        Ok(config)
    }
}

/// Read a required environment variable, failing with a descriptive error.
fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::config(format!(
            "required option {key} is not set; the gateway cannot start without it"
        ))),
    }
}

/// Parse an optional numeric environment variable, failing on malformed input.
fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("option {key} has invalid value '{raw}'"))),
        Err(_) => Ok(None),
    }
}
