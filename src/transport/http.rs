use super::{Transport, TransportError, TransportOptions};
use async_trait::async_trait;
use keyring::Entry;
use serde_json::Value;
use std::env;
use std::time::Duration;

/// Delay before the first transport-level retry; doubles per retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Reqwest-backed transport with connection pooling and bounded retries.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("AI_ROUTER_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: None,
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build a transport for one provider's endpoint, resolving its
    /// credentials through [`resolve_api_key`](Self::resolve_api_key).
    /// Unresolved credentials leave the transport unauthenticated; the
    /// availability probe keeps such providers out of routing.
    pub fn for_provider(
        provider_id: &str,
        base_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let mut transport = Self::new(base_url)?;
        transport.api_key = Self::resolve_api_key(provider_id);
        Ok(transport)
    }

    /// Resolve a provider's API key: OS keyring first, then the
    /// `{PROVIDER}_API_KEY` environment variable.
    pub fn resolve_api_key(provider_id: &str) -> Option<String> {
        if let Ok(entry) = Entry::new("ai-router", provider_id) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }
        let var = format!("{}_API_KEY", provider_id.to_uppercase());
        env::var(var).ok()
    }

    async fn post_once(
        &self,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let mut request = self.client.post(url).json(payload).timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(TransportError::Http)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        path: &str,
        payload: &Value,
        options: TransportOptions,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let mut last_err = None;
        for attempt in 0..=options.retries {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt - 1);
                tracing::debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "retrying transport call");
                tokio::time::sleep(delay).await;
            }
            match self.post_once(&url, payload, options.timeout).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < options.retries => {
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        // Loop always returns before falling through unless retries raced out.
        Err(last_err.unwrap_or_else(|| TransportError::Other("retries exhausted".into())))
    }
}
