//! Single-flight collapsing of concurrent identical logical requests.
//!
//! The first caller for a key becomes the leader and runs the work; everyone
//! else subscribes to the leader's settlement. The in-flight entry is removed
//! unconditionally when the work settles, including when the leader panics or
//! is cancelled, so a key can never get permanently stuck.

use crate::catalog::ProviderId;
use crate::types::{Request, Response};
use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Prompts are truncated to this many characters when deriving the key.
/// Deliberate approximate-match policy: near-duplicate long prompts may
/// collapse, which is acceptable for these task semantics.
const PROMPT_KEY_CHARS: usize = 100;

type Settled = std::result::Result<Response, Arc<Error>>;

/// Derive the dedupe key identifying "the same logical request".
pub fn dedupe_key(request: &Request) -> String {
    let prompt_head: String = request.prompt.chars().take(PROMPT_KEY_CHARS).collect();
    let provider = request
        .explicit_provider
        .as_ref()
        .map(ProviderId::as_str)
        .unwrap_or("auto");
    let mut hasher = Sha256::new();
    hasher.update(request.task.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(prompt_head.as_bytes());
    hasher.update(b"|");
    hasher.update(provider.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub struct Deduplicator {
    in_flight: Mutex<HashMap<String, broadcast::Sender<Settled>>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Number of unique keys currently executing.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    /// Run `work` unless an identical request is already in flight, in which
    /// case await that execution's result instead.
    ///
    /// Followers receive the leader's error wrapped as [`Error::Shared`]; the
    /// leader itself gets the plain error unless followers were listening.
    pub async fn run_deduped<F>(&self, key: &str, work: F) -> Result<Response>
    where
        F: Future<Output = Result<Response>>,
    {
        let receiver = {
            let mut map = self.in_flight.lock().unwrap();
            match map.get(key) {
                Some(tx) => Some(tx.subscribe()),
                None => {
                    // One settlement message per key; capacity 1 suffices.
                    let (tx, _) = broadcast::channel(1);
                    map.insert(key.to_string(), tx);
                    None
                }
            }
        };

        if let Some(mut rx) = receiver {
            return match rx.recv().await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(shared)) => Err(Error::Shared(shared)),
                // Leader dropped without settling.
                Err(_) => Err(Error::Interrupted),
            };
        }

        // Leader path. The guard removes the entry even if `work` panics or
        // this future is dropped mid-execution.
        let guard = InFlightGuard {
            dedupe: self,
            key: key.to_string(),
        };
        let result = work.await;
        let tx = guard.release();

        match result {
            Ok(response) => {
                if let Some(tx) = tx {
                    let _ = tx.send(Ok(response.clone()));
                }
                Ok(response)
            }
            // The error is only moved into an Arc when a follower is actually
            // listening; a lone caller gets it unwrapped. No new follower can
            // subscribe here, the entry is already gone.
            Err(err) => match tx {
                Some(tx) if tx.receiver_count() > 0 => {
                    let shared = Arc::new(err);
                    let _ = tx.send(Err(Arc::clone(&shared)));
                    Err(Error::Shared(shared))
                }
                _ => Err(err),
            },
        }
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlightGuard<'a> {
    dedupe: &'a Deduplicator,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    /// Remove the entry now and hand back the sender for settlement.
    fn release(self) -> Option<broadcast::Sender<Settled>> {
        let tx = self.dedupe.in_flight.lock().unwrap().remove(&self.key);
        std::mem::forget(self);
        tx
    }
}

impl<'a> Drop for InFlightGuard<'a> {
    fn drop(&mut self) {
        // Abnormal exit: drop the sender so followers observe Closed.
        self.dedupe.in_flight.lock().unwrap().remove(&self.key);
    }
}
