//! Gateway module: the tool-invocation pipeline.
//!
//! Every tool call flows through the same stages:
//!
//! ```text
//! host -> Dispatcher::invoke
//!           validator   (pure argument checks, fail fast)
//!           governor    (admission: permit + optional rate spacing)
//!           credentials (cached session, single-flight refresh)
//!           upstream    (business-logic collaborator, per-call timeout)
//!           normalizer  (upstream output -> fixed record shape)
//!        -> ToolResponse envelope
//! ```
//!
//! The dispatcher is infallible: every failure along the pipeline is
//! converted into one of the closed [`ErrorKind`] values. Validation and
//! admission failures never reach the collaborator layer.

pub mod credentials;
pub mod dispatcher;
pub mod governor;
pub mod normalizer;
pub mod request;
pub mod upstream;
pub mod validator;

pub use credentials::{AuthError, AuthSession, Authenticator, CredentialCache, IssuedCredential};
pub use dispatcher::Dispatcher;
pub use governor::{Governor, InvocationSlot, ThrottledError};
pub use normalizer::{NormalizeError, ResourceRecord, normalize};
pub use request::{ErrorKind, ResponseError, ToolRequest, ToolResponse};
pub use upstream::{Backend, BackendError, HttpAuthenticator, HttpBackend};
pub use validator::{SearchResourcesArgs, ValidatedCall, ValidationError, validate};
