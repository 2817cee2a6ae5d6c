//! Tool dispatcher: the façade the server calls per invocation.
//!
//! `invoke` never returns an error. Every failure along the pipeline is
//! converted into a failure envelope with one of the closed [`ErrorKind`]
//! values; unexpected faults are logged in full and surfaced with a
//! sanitized message. The governor slot is scoped to the invocation and
//! released on every exit path, including panics and cancellation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::{debug, error, instrument, warn};

use super::credentials::{Authenticator, CredentialCache};
use super::governor::Governor;
use super::normalizer::{ResourceRecord, normalize};
use super::request::{ErrorKind, ToolRequest, ToolResponse};
use super::upstream::{Backend, BackendError};
use super::validator::{ValidatedCall, validate};
use crate::core::config::Config;

/// Orchestrates validator, governor, credential cache, and the upstream
/// collaborator for every tool invocation.
pub struct Dispatcher {
    governor: Governor,
    credentials: CredentialCache,
    backend: Arc<dyn Backend>,
    identity: String,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        config: &Config,
        authenticator: Arc<dyn Authenticator>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let gateway = &config.gateway;
        Self {
            governor: Governor::new(
                gateway.max_concurrent,
                Duration::from_millis(gateway.acquire_timeout_ms),
                gateway.min_interval_ms.map(Duration::from_millis),
            ),
            credentials: CredentialCache::new(
                authenticator,
                chrono::Duration::seconds(gateway.auth_safety_margin_secs),
                Duration::from_millis(gateway.auth_timeout_ms),
            ),
            backend,
            identity: config.credentials.identity.clone(),
            call_timeout: Duration::from_millis(gateway.timeout_ms),
        }
    }

    /// The governor, for introspection.
    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// The credential cache, for explicit invalidation by hosts.
    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    /// Run one tool invocation through the pipeline.
    ///
    /// Stage order is fixed: validate, admit, authenticate, execute,
    /// normalize. Validation and admission failures never reach the
    /// collaborator layer.
    #[instrument(
        skip(self, request),
        fields(tool = %request.tool_name, request_id = %request.request_id)
    )]
    pub async fn invoke(&self, request: ToolRequest) -> ToolResponse {
        // Stage 1: validation. Pure, so a rejected call consumes no slot
        // and triggers no credential work.
        let validated = match validate(&request.tool_name, &request.arguments) {
            Ok(validated) => validated,
            Err(e) => {
                debug!(error = %e, "rejected before admission");
                return ToolResponse::fail(&request, ErrorKind::InvalidArgument, e.to_string());
            }
        };

        // Stage 2: admission. The slot is scoped to this function; dropping
        // it on any exit path below is the release.
        let _slot = match self.governor.acquire(&self.identity).await {
            Ok(slot) => slot,
            Err(e) => {
                warn!(error = %e, "invocation throttled");
                return ToolResponse::fail(&request, ErrorKind::Throttled, e.to_string());
            }
        };

        // Stage 3: credentials. A refresh failure fails this request;
        // retry policy belongs to the host.
        let session = match self.credentials.get(&self.identity).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "authentication failed");
                return ToolResponse::fail(&request, ErrorKind::Unauthenticated, e.to_string());
            }
        };

        // Stage 4: the collaborator call, bounded by the per-call deadline.
        // Panics are contained here so a faulty backend cannot poison the
        // server; the host sees a sanitized internal_error.
        let call = self
            .backend
            .execute(validated.operation(), &validated, &session.token);
        let outcome = tokio::time::timeout(self.call_timeout, AssertUnwindSafe(call).catch_unwind())
            .await;

        let raw = match outcome {
            Err(_) => {
                warn!(timeout_ms = self.call_timeout.as_millis() as u64, "upstream call timed out");
                return ToolResponse::fail(
                    &request,
                    ErrorKind::Timeout,
                    format!(
                        "upstream call exceeded {} ms",
                        self.call_timeout.as_millis()
                    ),
                );
            }
            Ok(Err(panic)) => {
                error!(detail = ?panic_message(&panic), "collaborator panicked");
                return ToolResponse::fail(
                    &request,
                    ErrorKind::InternalError,
                    "unexpected internal fault",
                );
            }
            Ok(Ok(Err(e))) => {
                let kind = match &e {
                    BackendError::Malformed(_) => ErrorKind::MalformedUpstreamData,
                    BackendError::Upstream(_) | BackendError::Unreachable(_) => {
                        ErrorKind::UpstreamError
                    }
                };
                warn!(error = %e, "upstream reported failure");
                return ToolResponse::fail(&request, kind, sanitize(&e.to_string(), &session.token));
            }
            Ok(Ok(Ok(raw))) => raw,
        };

        // Stage 5: normalization into the fixed payload shape.
        match normalize(&raw) {
            Ok(records) => {
                debug!(total = records.len(), "invocation succeeded");
                ToolResponse::ok(&request, build_payload(&validated, records))
            }
            Err(e) => {
                warn!(error = %e, "upstream data did not normalize");
                ToolResponse::fail(&request, ErrorKind::MalformedUpstreamData, e.to_string())
            }
        }
    }
}

/// Assemble the success payload for a validated call.
fn build_payload(call: &ValidatedCall, records: Vec<ResourceRecord>) -> Value {
    match call {
        ValidatedCall::SearchResources(args) => json!({
            "query": args.query,
            "total_found": records.len(),
            "limit": args.limit,
            "resources": records,
        }),
    }
}

/// Strip the session token from a message before it leaves the gateway.
fn sanitize(message: &str, token: &str) -> String {
    if token.is_empty() {
        message.to_string()
    } else {
        message.replace(token, "[REDACTED]")
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
