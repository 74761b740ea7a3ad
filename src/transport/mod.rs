//! Transport boundary: opaque HTTP plumbing supplied by the host application.
//!
//! The router only ever calls [`Transport::post`]; retry and timeout policy
//! per call is passed in via [`TransportOptions`]. [`HttpTransport`] is the
//! stock reqwest-backed implementation.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Per-call knobs handed to the transport by the executor.
#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    pub timeout: Duration,
    /// Transport-level retries on transient failures, on top of the single
    /// logical attempt the executor accounts for.
    pub retries: u32,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Transient failures are worth retrying within one attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout(_) => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Http(e) => e.is_timeout() || e.is_connect(),
            TransportError::Other(_) => false,
        }
    }
}

/// One logical upstream endpoint per provider; payload shape is the
/// adapter's concern, delivery is the transport's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        path: &str,
        payload: &Value,
        options: TransportOptions,
    ) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(TransportError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(TransportError::Status {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!TransportError::Status {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!TransportError::Other("bad".into()).is_transient());
    }
}
