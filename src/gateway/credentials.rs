//! Credential cache with single-flight refresh.
//!
//! The cache owns at most one non-expired [`AuthSession`] per backend
//! identity. A `get` on a fresh session performs no I/O; an expired or
//! missing session triggers exactly one refresh through the
//! [`Authenticator`] collaborator, no matter how many callers arrive while
//! the refresh is in flight. Every waiter receives the same session or the
//! same failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A credential freshly issued by the authenticator.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Failure to obtain a session. Cloneable so every single-flight waiter can
/// receive the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The authenticator answered and said no.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The authenticator could not be reached.
    #[error("authenticator unreachable: {0}")]
    Unavailable(String),

    /// The authenticator did not answer within its deadline.
    #[error("authentication timed out after {0} ms")]
    TimedOut(u64),
}

/// Capability for obtaining credentials from the outside world.
///
/// The cache treats implementations as untrusted I/O and bounds each call
/// with its own timeout.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, identity: &str) -> Result<IssuedCredential, AuthError>;
}

/// A cached, time-bounded authentication session.
#[derive(Clone)]
pub struct AuthSession {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub backend_identity: String,
}

impl AuthSession {
    /// Whether the session is still usable given the safety margin.
    pub fn is_fresh(&self, safety_margin: chrono::Duration) -> bool {
        Utc::now() < self.expires_at - safety_margin
    }
}

/// Custom Debug implementation to keep tokens out of logs.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("backend_identity", &self.backend_identity)
            .finish()
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<AuthSession, AuthError>>>;

#[derive(Default)]
struct CacheEntry {
    session: Option<AuthSession>,
    inflight: Option<SharedRefresh>,
}

/// Session cache keyed by backend identity.
pub struct CredentialCache {
    authenticator: Arc<dyn Authenticator>,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    safety_margin: chrono::Duration,
    auth_timeout: Duration,
}

impl CredentialCache {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        safety_margin: chrono::Duration,
        auth_timeout: Duration,
    ) -> Self {
        Self {
            authenticator,
            entries: Arc::new(Mutex::new(HashMap::new())),
            safety_margin,
            auth_timeout,
        }
    }

    /// Return a usable session for `identity`, refreshing if needed.
    ///
    /// Concurrent callers for the same identity while a refresh is in flight
    /// all await that one refresh; none issues a duplicate authentication
    /// call. On failure the stale session (if any) is evicted so the next
    /// call retries instead of reusing a known-bad token.
    pub async fn get(&self, identity: &str) -> Result<AuthSession, AuthError> {
        let refresh = {
            let mut entries = self.entries.lock().unwrap();
            let entry = entries.entry(identity.to_string()).or_default();

            if let Some(session) = &entry.session {
                if session.is_fresh(self.safety_margin) {
                    return Ok(session.clone());
                }
                debug!(identity, "cached session expiring, refreshing");
            }

            match &entry.inflight {
                Some(shared) => shared.clone(),
                None => {
                    let shared = self.start_refresh(identity.to_string());
                    entry.inflight = Some(shared.clone());
                    shared
                }
            }
        };

        refresh.await
    }

    /// Evict any cached session for `identity`.
    ///
    /// An in-flight refresh is left alone; its result will repopulate the
    /// cache when it lands.
    pub fn invalidate(&self, identity: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(identity) {
            entry.session = None;
        }
    }

    /// Whether a fresh session is currently cached (no refresh would occur).
    pub fn has_fresh_session(&self, identity: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(identity)
            .and_then(|e| e.session.as_ref())
            .is_some_and(|s| s.is_fresh(self.safety_margin))
    }

    /// Build the single refresh future shared by all waiters. The future
    /// itself stores its outcome back into the cache exactly once.
    fn start_refresh(&self, identity: String) -> SharedRefresh {
        let authenticator = Arc::clone(&self.authenticator);
        let entries = Arc::clone(&self.entries);
        let auth_timeout = self.auth_timeout;

        async move {
            let outcome =
                match tokio::time::timeout(auth_timeout, authenticator.authenticate(&identity))
                    .await
                {
                    Ok(Ok(issued)) => Ok(AuthSession {
                        token: issued.token,
                        issued_at: Utc::now(),
                        expires_at: issued.expires_at,
                        backend_identity: identity.clone(),
                    }),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(AuthError::TimedOut(auth_timeout.as_millis() as u64)),
                };

            let mut entries = entries.lock().unwrap();
            let entry = entries.entry(identity.clone()).or_default();
            entry.inflight = None;
            match &outcome {
                Ok(session) => {
                    info!(%identity, expires_at = %session.expires_at, "session refreshed");
                    entry.session = Some(session.clone());
                }
                Err(e) => {
                    warn!(%identity, error = %e, "session refresh failed, evicting");
                    entry.session = None;
                }
            }
            outcome
        }
        .boxed()
        .shared()
    }
}
