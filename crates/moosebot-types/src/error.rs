//! Error taxonomies for Moosebot.
//!
//! Four failure families, matching how they propagate:
//! - [`SessionError`]: fatal at session load, recoverable per call.
//! - [`ProviderError`]: upstream failures, recovered at handler boundary.
//! - [`GatewayError`]: outbound messaging failures.
//! - [`CredentialError`]: accessor-level token unavailability.

use thiserror::Error;

/// Errors from per-conversation session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Persisted state failed schema validation. Fatal for session load:
    /// the session must not silently reset to defaults.
    #[error("corrupt persisted state for conversation '{id}': {detail}")]
    Corrupt { id: String, detail: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from provider backend calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Http(String),

    /// The provider answered with an error payload (content policy
    /// rejection, quota, bad request).
    #[error("{message}")]
    Api { message: String },

    /// The response failed schema validation.
    #[error("unexpected response shape: {0}")]
    Schema(String),

    /// The provider returned a well-formed but empty answer.
    #[error("provider returned no content")]
    Empty,

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Errors from the messaging gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Http(String),

    #[error("gateway rejected the call: {0}")]
    Api(String),

    #[error("unexpected gateway response: {0}")]
    Schema(String),
}

/// Errors from the bearer-token accessor.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No token for this scope has ever been fetched successfully.
    #[error("no token obtained yet for scope '{scope}'")]
    NeverObtained { scope: String },

    #[error("unknown credential scope '{scope}'")]
    UnknownScope { scope: String },
}

/// Failure of a command handler, converted at the router boundary into a
/// single user-visible failure reply. Never crosses the router.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
