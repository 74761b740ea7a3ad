//! Usage telemetry: fire-and-forget reporting after each attempt.
//!
//! Sinks are external collaborators. The router spawns `record` calls and
//! swallows their failures; a broken sink must never fail a caller's request
//! or add latency to it.

use crate::catalog::ProviderId;
use crate::types::{Priority, TaskKind};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// One attempt's usage record, success or failure.
#[derive(Debug, Clone)]
pub struct UsageEvent {
    pub task: TaskKind,
    pub provider: ProviderId,
    pub model: String,
    pub tokens: u32,
    pub cost: f64,
    pub latency_ms: u64,
    pub cached: bool,
    pub priority: Priority,
    pub success: bool,
    pub timestamp_ms: u64,
}

impl UsageEvent {
    pub(crate) fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Destination for usage events.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, event: UsageEvent) -> std::result::Result<(), String>;
}

/// Default sink: discards everything.
pub struct NoopSink;

#[async_trait]
impl TelemetrySink for NoopSink {
    async fn record(&self, _event: UsageEvent) -> std::result::Result<(), String> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn TelemetrySink> {
    Arc::new(NoopSink)
}

/// Emits a structured log line per event.
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn record(&self, event: UsageEvent) -> std::result::Result<(), String> {
        tracing::info!(
            task = %event.task,
            provider = %event.provider,
            model = %event.model,
            tokens = event.tokens,
            cost = event.cost,
            latency_ms = event.latency_ms,
            cached = event.cached,
            success = event.success,
            "usage"
        );
        Ok(())
    }
}

/// In-memory sink for tests, bounded to `max_events` (oldest dropped first).
pub struct InMemorySink {
    events: RwLock<Vec<UsageEvent>>,
    max_events: usize,
}

impl InMemorySink {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TelemetrySink for InMemorySink {
    async fn record(&self, event: UsageEvent) -> std::result::Result<(), String> {
        let mut events = self.events.write().unwrap();
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}

/// Fans out to several sinks; individual failures are ignored.
pub struct CompositeSink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Default for CompositeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySink for CompositeSink {
    async fn record(&self, event: UsageEvent) -> std::result::Result<(), String> {
        for sink in &self.sinks {
            let _ = sink.record(event.clone()).await;
        }
        Ok(())
    }
}
