//! Router composition: the front door tying every subsystem together.
//!
//! A request flows cache -> dedupe -> (match, rate limit, execute, fall back)
//! with telemetry emitted fire-and-forget after every settled attempt. The
//! router owns its subsystems and the cache sweeper task; dropping the router
//! stops the sweeper.

mod fallback;

use crate::cache::{self, ResponseCache};
use crate::catalog::{ProviderCatalog, ProviderId, ProviderProfile};
use crate::dedupe::{dedupe_key, Deduplicator};
use crate::executor::Executor;
use crate::matcher::{AvailabilityProbe, CapabilityMatcher, EnvProbe};
use crate::resilience::RateLimiter;
use crate::telemetry::{noop_sink, TelemetrySink, UsageEvent};
use crate::transport::Transport;
use crate::types::{Request, Response};
use crate::{Error, Result};
use fallback::FallbackChain;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sub-batch size is the provider's per-minute budget over this divisor,
/// floored at one.
const SUB_BATCH_DIVISOR: u32 = 100;

/// Pause between consecutive sub-batches of one provider group.
const SUB_BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Multi-provider request router.
///
/// Construct through [`AiRouterBuilder`]; all collaborators are injected, so
/// independent routers never share state.
pub struct AiRouter {
    catalog: Arc<ProviderCatalog>,
    matcher: CapabilityMatcher,
    limiter: RateLimiter,
    dedupe: Deduplicator,
    cache: Arc<ResponseCache>,
    executor: Executor,
    telemetry: Arc<dyn TelemetrySink>,
    sweeper: JoinHandle<()>,
}

impl std::fmt::Debug for AiRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiRouter").finish_non_exhaustive()
    }
}

impl AiRouter {
    pub fn builder() -> AiRouterBuilder {
        AiRouterBuilder::new()
    }

    /// Route one request to completion.
    ///
    /// Checks the cache first, collapses concurrent identical requests into a
    /// single execution, then walks the candidate chain until a provider
    /// succeeds. Only configuration, exhaustion and deadline errors escape.
    pub async fn request(&self, request: Request) -> Result<Response> {
        if let Some(key) = &request.cache_key {
            if let Some(mut hit) = self.cache.get(key) {
                debug!(cache_key = %key, "serving response from cache");
                hit.served_from_cache = true;
                hit.latency_ms = 0;
                self.emit(UsageEvent {
                    task: request.task,
                    provider: hit.provider.clone(),
                    model: hit.model.clone(),
                    tokens: hit.tokens_estimated,
                    // No upstream spend on a hit.
                    cost: 0.0,
                    latency_ms: 0,
                    cached: true,
                    priority: request.priority,
                    success: true,
                    timestamp_ms: UsageEvent::now_ms(),
                });
                return Ok(hit);
            }
        }

        let key = dedupe_key(&request);
        self.dedupe
            .run_deduped(&key, self.attempt_chain(&request))
            .await
    }

    /// Route a set of requests concurrently, preserving input order.
    ///
    /// Requests are grouped by the provider the matcher would pick first and
    /// each group is split into paced sub-batches sized from the provider's
    /// per-minute budget. Groups run concurrently with one another; a failure
    /// in one slot never aborts the rest.
    pub async fn batch(&self, requests: Vec<Request>) -> Vec<Result<Response>> {
        let total = requests.len();
        let mut groups: Vec<(ProviderId, u32, Vec<(usize, Request)>)> = Vec::new();
        let mut failures: Vec<(usize, Error)> = Vec::new();

        for (index, request) in requests.into_iter().enumerate() {
            match self.matcher.candidates(&request) {
                Ok(candidates) => {
                    let first = candidates[0];
                    match groups.iter_mut().find(|(id, _, _)| *id == first.id) {
                        Some((_, _, items)) => items.push((index, request)),
                        None => groups.push((
                            first.id.clone(),
                            first.requests_per_minute,
                            vec![(index, request)],
                        )),
                    }
                }
                Err(err) => failures.push((index, err)),
            }
        }

        let grouped = futures::future::join_all(
            groups
                .into_iter()
                .map(|(provider, rpm, items)| self.run_group(provider, rpm, items)),
        )
        .await;

        let mut slots: Vec<Option<Result<Response>>> = (0..total).map(|_| None).collect();
        for (index, err) in failures {
            slots[index] = Some(Err(err));
        }
        for results in grouped {
            for (index, result) in results {
                slots[index] = Some(result);
            }
        }
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(Error::configuration("request slot was never filled")))
            })
            .collect()
    }

    /// Current number of live cache entries.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Providers the router knows about, in catalog order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.catalog.iter()
    }

    async fn run_group(
        &self,
        provider: ProviderId,
        requests_per_minute: u32,
        items: Vec<(usize, Request)>,
    ) -> Vec<(usize, Result<Response>)> {
        let sub_batch = (requests_per_minute / SUB_BATCH_DIVISOR).max(1) as usize;
        debug!(
            provider = %provider,
            requests = items.len(),
            sub_batch,
            "running batch group"
        );

        let mut results = Vec::with_capacity(items.len());
        for (i, chunk) in items.chunks(sub_batch).enumerate() {
            if i > 0 {
                tokio::time::sleep(SUB_BATCH_PAUSE).await;
            }
            let settled =
                futures::future::join_all(chunk.iter().map(|(index, request)| async move {
                    (*index, self.request(request.clone()).await)
                }))
            .await;
            results.extend(settled);
        }
        results
    }

    async fn attempt_chain(&self, request: &Request) -> Result<Response> {
        match request.timeout {
            Some(budget) => tokio::time::timeout(budget, self.try_candidates(request))
                .await
                .map_err(|_| Error::DeadlineExceeded)?,
            None => self.try_candidates(request).await,
        }
    }

    /// Walk the candidate chain front to back; each provider is tried once.
    async fn try_candidates(&self, request: &Request) -> Result<Response> {
        let candidates = self.matcher.candidates(request)?;
        let mut chain = FallbackChain::new(&candidates);
        let mut last_error: Option<Error> = None;

        while let Some(profile) = chain.advance() {
            self.limiter
                .acquire(&profile.id, profile.requests_per_minute)
                .await;

            let model = match self.resolve_model(profile, request) {
                Ok(model) => model,
                Err(err) => return Err(err),
            };

            match self.executor.execute(profile, &model, request).await {
                Ok(response) => {
                    if let Some(key) = &request.cache_key {
                        self.cache.put(
                            key.clone(),
                            response.clone(),
                            request.cache_ttl.unwrap_or(cache::DEFAULT_TTL),
                        );
                    }
                    self.emit(UsageEvent {
                        task: request.task,
                        provider: response.provider.clone(),
                        model: response.model.clone(),
                        tokens: response.tokens_estimated,
                        cost: response.cost_estimated,
                        latency_ms: response.latency_ms,
                        cached: false,
                        priority: request.priority,
                        success: true,
                        timestamp_ms: UsageEvent::now_ms(),
                    });
                    return Ok(response);
                }
                Err(err) => {
                    warn!(
                        provider = %profile.id,
                        error = %err,
                        "provider attempt failed, advancing to next candidate"
                    );
                    self.emit(UsageEvent {
                        task: request.task,
                        provider: profile.id.clone(),
                        model,
                        tokens: 0,
                        cost: 0.0,
                        latency_ms: 0,
                        cached: false,
                        priority: request.priority,
                        success: false,
                        timestamp_ms: UsageEvent::now_ms(),
                    });
                    last_error = Some(err);
                }
            }
        }

        debug!(
            attempts = chain.attempted(),
            "candidate chain exhausted without a success"
        );
        match last_error {
            Some(Error::Provider { provider, source }) => {
                Err(Error::Exhausted { provider, source })
            }
            Some(other) => Err(other),
            // The matcher guarantees a non-empty candidate list.
            None => Err(Error::configuration("no provider attempt was made")),
        }
    }

    fn resolve_model(&self, profile: &ProviderProfile, request: &Request) -> Result<String> {
        if let Some(model) = &request.explicit_model {
            return Ok(model.clone());
        }
        profile
            .default_model()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::configuration(format!("provider '{}' lists no models", profile.id))
            })
    }

    /// Fire-and-forget telemetry: never blocks or fails the caller's request.
    fn emit(&self, event: UsageEvent) {
        let sink = Arc::clone(&self.telemetry);
        tokio::spawn(async move {
            if let Err(err) = sink.record(event).await {
                debug!(error = %err, "telemetry sink rejected event");
            }
        });
    }
}

impl Drop for AiRouter {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

/// Builder for [`AiRouter`]. A transport is required; everything else has a
/// sensible default (builtin catalog, env-based availability, no telemetry).
pub struct AiRouterBuilder {
    catalog: Option<ProviderCatalog>,
    transport: Option<Arc<dyn Transport>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    probe: Option<Arc<dyn AvailabilityProbe>>,
    sweep_interval: Duration,
}

impl AiRouterBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            transport: None,
            telemetry: None,
            probe: None,
            sweep_interval: cache::SWEEP_INTERVAL,
        }
    }

    pub fn with_catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn with_availability(mut self, probe: Arc<dyn AvailabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Assemble the router and start its cache sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<AiRouter> {
        let transport = self
            .transport
            .ok_or_else(|| Error::configuration("a transport is required"))?;
        let catalog = self.catalog.unwrap_or_else(ProviderCatalog::builtin);
        if catalog.is_empty() {
            return Err(Error::configuration("provider catalog is empty"));
        }
        let catalog = Arc::new(catalog);
        let probe: Arc<dyn AvailabilityProbe> = self
            .probe
            .unwrap_or_else(|| Arc::new(EnvProbe::new()));
        let telemetry = self.telemetry.unwrap_or_else(noop_sink);

        let cache = Arc::new(ResponseCache::new());
        let sweeper = spawn_sweeper(Arc::clone(&cache), self.sweep_interval);

        Ok(AiRouter {
            matcher: CapabilityMatcher::new(Arc::clone(&catalog), probe),
            catalog,
            limiter: RateLimiter::new(),
            dedupe: Deduplicator::new(),
            cache,
            executor: Executor::new(transport),
            telemetry,
            sweeper,
        })
    }
}

impl Default for AiRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_sweeper(cache: Arc<ResponseCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = cache.sweep();
            if purged > 0 {
                debug!(purged, "cache sweep removed expired entries");
            }
        }
    })
}
