use crate::catalog::ProviderId;
use crate::transport::TransportError;
use std::sync::Arc;
use thiserror::Error;

/// Unified error type for the router.
///
/// Only `Configuration`, `Exhausted` and `DeadlineExceeded` (possibly wrapped
/// in `Shared` by the deduplicator) cross the subsystem boundary from
/// [`crate::AiRouter::request`]. Per-provider failures are recovered
/// internally by the fallback chain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A single provider attempt failed. Triggers fallback; surfaced only
    /// indirectly through `Exhausted`.
    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: ProviderId,
        #[source]
        source: ProviderFailure,
    },

    /// Every candidate provider failed. Carries the most recent cause, not a
    /// merged list, so callers get the most specific diagnosis.
    #[error("all candidate providers failed; last attempt on '{provider}': {source}")]
    Exhausted {
        provider: ProviderId,
        #[source]
        source: ProviderFailure,
    },

    /// The caller's total deadline elapsed before any provider succeeded.
    #[error("request deadline exceeded before a provider succeeded")]
    DeadlineExceeded,

    /// A deduplicated follower observed the leader settle with this error.
    #[error("{0}")]
    Shared(Arc<Error>),

    /// The in-flight leader for a deduplicated request went away without
    /// settling (dropped or panicked).
    #[error("deduplicated execution was interrupted before completion")]
    Interrupted,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cause of a single failed provider attempt.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The provider answered but the envelope carried no usable content.
    /// This is a failure, never a successful empty response.
    #[error("empty or missing content in provider response")]
    EmptyContent,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Look through `Shared` wrapping to the underlying error.
    pub fn unshared(&self) -> &Error {
        match self {
            Error::Shared(inner) => inner.unshared(),
            other => other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.unshared(), Error::Configuration { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.unshared(), Error::Exhausted { .. })
    }

    /// Provider named by an `Exhausted` (or `Provider`) error, if any.
    pub fn failed_provider(&self) -> Option<&ProviderId> {
        match self.unshared() {
            Error::Exhausted { provider, .. } | Error::Provider { provider, .. } => Some(provider),
            _ => None,
        }
    }
}
