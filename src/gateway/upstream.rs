//! Upstream collaborators: the authenticator and the business-logic backend.
//!
//! Both live behind capability traits so the dispatcher core stays
//! independent of any specific service. The HTTP implementations here target
//! the conventional endpoint pair `POST {base_url}/auth` and
//! `GET {base_url}/search`; other deployments supply their own
//! implementations.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::credentials::{AuthError, Authenticator, IssuedCredential};
use super::validator::ValidatedCall;
use crate::core::config::Config;
use crate::core::error::{Error, Result};

/// Failure reported by the business-logic backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The collaborator answered with an error of its own.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The collaborator could not be reached at all.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The collaborator answered with a body that is not even parseable.
    #[error("upstream returned malformed data: {0}")]
    Malformed(String),
}

/// Capability for executing business-logic operations.
///
/// The actual domain logic (a real search API, a database, anything) lives
/// behind this seam and is outside the gateway core.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(
        &self,
        operation: &str,
        call: &ValidatedCall,
        token: &str,
    ) -> std::result::Result<Value, BackendError>;
}

// ============================================================================
// HTTP implementations
// ============================================================================

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    identity: &'a str,
    secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    expires_in: i64,
}

/// Authenticator that mints tokens from `POST {base_url}/auth`.
pub struct HttpAuthenticator {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

impl HttpAuthenticator {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.gateway.auth_timeout_ms))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.gateway.base_url.trim_end_matches('/').to_string(),
            secret: config.credentials.secret.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(
        &self,
        identity: &str,
    ) -> std::result::Result<IssuedCredential, AuthError> {
        let url = format!("{}/auth", self.base_url);
        debug!(identity, %url, "requesting session token");

        let response = self
            .http
            .post(&url)
            .json(&AuthRequest {
                identity,
                secret: &self.secret,
            })
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(format!(
                "authenticator answered {status}"
            )));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Rejected(format!("unreadable token response: {e}")))?;

        Ok(IssuedCredential {
            token: body.token,
            expires_at: Utc::now() + ChronoDuration::seconds(body.expires_in.max(0)),
        })
    }
}

/// Backend that executes searches against `GET {base_url}/search`.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.gateway.timeout_ms))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.gateway.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, limit: u64) -> std::result::Result<String, BackendError> {
        let params = serde_urlencoded::to_string([
            ("q", query),
            ("limit", limit.to_string().as_str()),
        ])
        .map_err(|e| BackendError::Unreachable(format!("could not encode query: {e}")))?;
        Ok(format!("{}/search?{}", self.base_url, params))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn execute(
        &self,
        operation: &str,
        call: &ValidatedCall,
        token: &str,
    ) -> std::result::Result<Value, BackendError> {
        match call {
            ValidatedCall::SearchResources(args) => {
                let url = self.search_url(&args.query, args.limit)?;
                debug!(operation, %url, "executing upstream search");

                let response = self
                    .http
                    .get(&url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| BackendError::Unreachable(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    let detail = detail.chars().take(200).collect::<String>();
                    return Err(BackendError::Upstream(format!(
                        "search answered {status}: {detail}"
                    )));
                }

                response
                    .json()
                    .await
                    .map_err(|e| BackendError::Malformed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::validator::SearchResourcesArgs;

    fn backend() -> HttpBackend {
        HttpBackend::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = backend().search_url("data governance & more", 5).unwrap();
        assert_eq!(
            url,
            "http://127.0.0.1:8080/search?q=data+governance+%26+more&limit=5"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut config = Config::default();
        config.gateway.base_url = "http://upstream.test/".to_string();
        let backend = HttpBackend::new(&config).unwrap();
        let url = backend.search_url("x", 1).unwrap();
        assert!(url.starts_with("http://upstream.test/search?"));
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_unreachable() {
        // Port 1 on localhost: connection refused, no network dependency.
        let mut config = Config::default();
        config.gateway.base_url = "http://127.0.0.1:1".to_string();
        config.gateway.timeout_ms = 2_000;
        let backend = HttpBackend::new(&config).unwrap();

        let call = ValidatedCall::SearchResources(SearchResourcesArgs {
            query: "reports".to_string(),
            limit: 5,
        });
        let err = backend
            .execute("search_resources", &call, "token")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_authenticator_unreachable_maps_to_unavailable() {
        let mut config = Config::default();
        config.gateway.base_url = "http://127.0.0.1:1".to_string();
        config.gateway.auth_timeout_ms = 2_000;
        let authenticator = HttpAuthenticator::new(&config).unwrap();

        let err = authenticator.authenticate("svc").await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
    }
}
