//! Fixed-window request budget, one window per provider.
//!
//! `acquire` blocks (a single bounded sleep until the window resets) rather
//! than rejecting. Concurrently blocked callers all wake at the reset instant
//! and race to increment, so a small overshoot of the limit is possible; this
//! favors simplicity over strict fairness and is accepted behavior.

use crate::catalog::ProviderId;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone)]
pub struct RateWindowSnapshot {
    pub count: u32,
    pub remaining_ms: u64,
}

/// Per-provider sliding-window counter gating request starts.
pub struct RateLimiter {
    windows: Mutex<HashMap<ProviderId, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a slot for `provider` under `limit` requests per window.
    ///
    /// Returns immediately while the window has budget; otherwise sleeps
    /// exactly until the reset instant and proceeds. A `limit` of zero means
    /// unlimited.
    pub async fn acquire(&self, provider: &ProviderId, limit: u32) {
        if limit == 0 {
            return;
        }

        let deadline = {
            let mut windows = self.windows.lock().await;
            let now = Instant::now();
            let window = windows.entry(provider.clone()).or_insert_with(|| Window {
                count: 0,
                reset_at: now + WINDOW,
            });
            if now >= window.reset_at {
                window.count = 0;
                window.reset_at = now + WINDOW;
            }
            if window.count < limit {
                window.count += 1;
                return;
            }
            window.reset_at
        };

        tracing::debug!(
            provider = %provider,
            wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
            "rate limit reached, waiting for window reset"
        );
        tokio::time::sleep_until(deadline).await;

        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        if let Some(window) = windows.get_mut(provider) {
            if now >= window.reset_at {
                window.count = 0;
                window.reset_at = now + WINDOW;
            }
            // Waiters that raced ahead already incremented; we proceed
            // regardless (documented overshoot).
            window.count += 1;
        }
    }

    pub async fn snapshot(&self, provider: &ProviderId) -> Option<RateWindowSnapshot> {
        let windows = self.windows.lock().await;
        windows.get(provider).map(|w| RateWindowSnapshot {
            count: w.count,
            remaining_ms: w
                .reset_at
                .saturating_duration_since(Instant::now())
                .as_millis() as u64,
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
