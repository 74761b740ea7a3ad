//! Single-attempt execution against one provider.
//!
//! The executor owns no routing policy: it shapes the payload through the
//! provider's adapter, drives the injected transport with the right timeout
//! and retry budget, normalizes the response and prices it. Fallback loops
//! live in the router.

use crate::adapters::adapter_for;
use crate::catalog::ProviderProfile;
use crate::error::ProviderFailure;
use crate::transport::{Transport, TransportOptions};
use crate::types::{Request, Response};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Character-count token heuristic: roughly 4 characters per token.
const CHARS_PER_TOKEN: usize = 4;

pub(crate) fn estimate_tokens(char_count: usize) -> u32 {
    ((char_count / CHARS_PER_TOKEN).max(1)) as u32
}

pub struct Executor {
    transport: Arc<dyn Transport>,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Drive one attempt against `profile` with `model`.
    ///
    /// Any transport or envelope failure maps to [`Error::Provider`] carrying
    /// the provider id, so the fallback chain can attribute it.
    pub async fn execute(
        &self,
        profile: &ProviderProfile,
        model: &str,
        request: &Request,
    ) -> Result<Response> {
        let adapter = adapter_for(profile.api_style);
        let payload = adapter.build_payload(model, request);
        let path = profile.endpoint_path.replace("{model}", model);
        let options = TransportOptions {
            timeout: request.timeout.unwrap_or(profile.default_timeout),
            retries: profile.transport_retries,
        };
        let attempt_id = Uuid::new_v4();

        debug!(
            provider = %profile.id,
            model,
            attempt_id = %attempt_id,
            timeout_ms = options.timeout.as_millis() as u64,
            "executing provider attempt"
        );

        let start = Instant::now();
        let body = self
            .transport
            .post(&path, &payload, options)
            .await
            .map_err(|source| Error::Provider {
                provider: profile.id.clone(),
                source: ProviderFailure::Transport(source),
            })?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let content = adapter
            .extract_content(&body)
            .map_err(|source| Error::Provider {
                provider: profile.id.clone(),
                source,
            })?;

        let tokens_estimated =
            estimate_tokens(request.prompt.chars().count() + content.chars().count());
        let cost_estimated =
            tokens_estimated as f64 / 1000.0 * profile.cost_per_thousand_tokens;

        info!(
            provider = %profile.id,
            model,
            attempt_id = %attempt_id,
            latency_ms,
            tokens = tokens_estimated,
            "provider attempt succeeded"
        );

        Ok(Response {
            content,
            provider: profile.id.clone(),
            model: model.to_string(),
            tokens_estimated,
            cost_estimated,
            latency_ms,
            served_from_cache: false,
        })
    }
}
