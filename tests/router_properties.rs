//! End-to-end router behavior over a scripted in-process transport.

use ai_router::telemetry::InMemorySink;
use ai_router::transport::{Transport, TransportError, TransportOptions};
use ai_router::{
    AiRouter, ApiStyle, Error, Hint, ProviderCatalog, ProviderId, ProviderProfile, Request,
    StaticProbe, TaskKind,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Answers per provider based on the endpoint path, with optional scripted
/// failures and latency. Records every call in order.
struct FakeTransport {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            delays: HashMap::new(),
        }
    }

    fn failing(mut self, provider: &str) -> Self {
        self.failing.insert(provider.to_string());
        self
    }

    fn delay(mut self, provider: &str, delay: Duration) -> Self {
        self.delays.insert(provider.to_string(), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn provider_of(path: &str) -> &'static str {
    if path == "/v1/chat/completions" {
        "openai"
    } else if path == "/v1/messages" {
        "anthropic"
    } else {
        "gemini"
    }
}

fn body_for(provider: &str) -> Value {
    match provider {
        "openai" => serde_json::json!({
            "choices": [{"message": {"content": "from openai"}}]
        }),
        "anthropic" => serde_json::json!({
            "content": [{"type": "text", "text": "from anthropic"}]
        }),
        _ => serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "from gemini"}]}}]
        }),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post(
        &self,
        path: &str,
        _payload: &Value,
        _options: TransportOptions,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(path.to_string());
        let provider = provider_of(path);
        if let Some(delay) = self.delays.get(provider) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(provider) {
            return Err(TransportError::Status {
                status: 503,
                body: format!("{provider} unavailable"),
            });
        }
        Ok(body_for(provider))
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn router_with(transport: Arc<FakeTransport>) -> AiRouter {
    init_tracing();
    AiRouter::builder()
        .with_transport(transport)
        .with_availability(Arc::new(StaticProbe::all()))
        .build()
        .unwrap()
}

fn single_provider_catalog(requests_per_minute: u32) -> ProviderCatalog {
    ProviderCatalog::new(vec![ProviderProfile {
        id: ProviderId::from("openai"),
        api_style: ApiStyle::OpenAi,
        supported_models: vec!["gpt-4o".into()],
        capabilities: HashSet::new(),
        max_context_tokens: 128_000,
        requests_per_minute,
        cost_per_thousand_tokens: 0.01,
        default_timeout: Duration::from_secs(30),
        transport_retries: 0,
        endpoint_path: "/v1/chat/completions".into(),
    }])
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_requests_execute_once() {
    let transport = Arc::new(FakeTransport::new().delay("openai", Duration::from_millis(50)));
    let router = Arc::new(router_with(transport.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            router
                .request(Request::new(TaskKind::Question, "what is the capital of France?"))
                .await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.content, "from openai");
    }
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_round_trip_and_expiry() {
    let transport = Arc::new(FakeTransport::new());
    let router = router_with(transport.clone());
    let request = || {
        Request::new(TaskKind::Question, "cached question")
            .cached("q:cached", Duration::from_secs(60))
    };

    let first = router.request(request()).await.unwrap();
    assert!(!first.served_from_cache);
    assert_eq!(transport.call_count(), 1);

    let second = router.request(request()).await.unwrap();
    assert!(second.served_from_cache);
    assert_eq!(second.latency_ms, 0);
    assert_eq!(second.content, first.content);
    assert_eq!(transport.call_count(), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    let third = router.request(request()).await.unwrap();
    assert!(!third.served_from_cache);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_delays_excess_calls() {
    init_tracing();
    let transport = Arc::new(FakeTransport::new());
    let router = AiRouter::builder()
        .with_transport(transport)
        .with_catalog(single_provider_catalog(2))
        .with_availability(Arc::new(StaticProbe::all()))
        .build()
        .unwrap();

    let before = Instant::now();
    router
        .request(Request::new(TaskKind::Question, "first"))
        .await
        .unwrap();
    router
        .request(Request::new(TaskKind::Question, "second"))
        .await
        .unwrap();
    assert_eq!(Instant::now(), before);

    // Third call in the window waits for the reset, it is never rejected.
    router
        .request(Request::new(TaskKind::Question, "third"))
        .await
        .unwrap();
    let waited = Instant::now() - before;
    assert!(waited >= Duration::from_secs(59));
    assert!(waited <= Duration::from_secs(61));
}

#[tokio::test]
async fn test_fallback_walks_candidates_in_order() {
    let transport = Arc::new(
        FakeTransport::new()
            .failing("anthropic")
            .failing("openai"),
    );
    let router = router_with(transport.clone());

    let response = router
        .request(Request::new(TaskKind::Research, "dig into this topic"))
        .await
        .unwrap();

    assert_eq!(response.provider.as_str(), "gemini");
    assert_eq!(response.content, "from gemini");
    // Research order is anthropic, openai, gemini; each tried exactly once.
    assert_eq!(
        transport.calls(),
        vec![
            "/v1/messages".to_string(),
            "/v1/chat/completions".to_string(),
            "/v1beta/models/gemini-1.5-pro:generateContent".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_exhaustion_reports_last_provider() {
    let transport = Arc::new(
        FakeTransport::new()
            .failing("anthropic")
            .failing("openai")
            .failing("gemini"),
    );
    let router = router_with(transport.clone());

    let err = router
        .request(Request::new(TaskKind::Research, "doomed request"))
        .await
        .unwrap_err();

    // A sole caller gets the exhaustion error directly, not a Shared wrapper.
    assert!(matches!(err, Error::Exhausted { .. }));
    // The last candidate for research is gemini.
    assert_eq!(err.failed_provider().map(|p| p.as_str()), Some("gemini"));
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_explicit_provider_overrides_hints() {
    let transport = Arc::new(FakeTransport::new());
    let router = router_with(transport.clone());

    let response = router
        .request(
            Request::new(TaskKind::Question, "describe this image")
                .hint(Hint::HasImagesOrVideo)
                .provider("anthropic"),
        )
        .await
        .unwrap();

    assert_eq!(response.provider.as_str(), "anthropic");
    assert_eq!(transport.calls(), vec!["/v1/messages".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_the_whole_chain() {
    let transport = Arc::new(FakeTransport::new().delay("openai", Duration::from_secs(10)));
    let router = router_with(transport);

    let err = router
        .request(
            Request::new(TaskKind::Question, "slow question").timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_batch_preserves_input_order() {
    let transport = Arc::new(
        FakeTransport::new()
            .delay("anthropic", Duration::from_millis(100))
            .delay("openai", Duration::from_millis(10))
            .delay("gemini", Duration::from_millis(50)),
    );
    let router = router_with(transport);

    let results = router
        .batch(vec![
            Request::new(TaskKind::Question, "one").provider("anthropic"),
            Request::new(TaskKind::Question, "two").provider("openai"),
            Request::new(TaskKind::Question, "three").provider("gemini"),
        ])
        .await;

    assert_eq!(results.len(), 3);
    let providers: Vec<&str> = results
        .iter()
        .map(|r| r.as_ref().unwrap().provider.as_str())
        .collect();
    // Slowest first in the input stays first in the output.
    assert_eq!(providers, vec!["anthropic", "openai", "gemini"]);
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let transport = Arc::new(FakeTransport::new());
    let router = router_with(transport);

    let results = router
        .batch(vec![
            Request::new(TaskKind::Question, "fine").provider("openai"),
            Request::new(TaskKind::Question, "broken").provider("no-such-provider"),
            Request::new(TaskKind::Question, "also fine").provider("gemini"),
        ])
        .await;

    assert!(results[0].is_ok());
    assert!(results[1].as_ref().unwrap_err().is_configuration());
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn test_telemetry_records_failures_and_successes() {
    init_tracing();
    let transport = Arc::new(FakeTransport::new().failing("anthropic"));
    let sink = Arc::new(InMemorySink::new(100));
    let router = AiRouter::builder()
        .with_transport(transport)
        .with_telemetry(sink.clone())
        .with_availability(Arc::new(StaticProbe::all()))
        .build()
        .unwrap();

    // Research tries anthropic first (fails), then openai (succeeds).
    router
        .request(
            Request::new(TaskKind::Research, "observed request")
                .cached("r:observed", Duration::from_secs(60)),
        )
        .await
        .unwrap();
    // Second call hits the cache.
    router
        .request(
            Request::new(TaskKind::Research, "observed request")
                .cached("r:observed", Duration::from_secs(60)),
        )
        .await
        .unwrap();

    // Telemetry is spawned fire-and-forget; let the tasks settle.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(!events[0].success);
    assert_eq!(events[0].provider.as_str(), "anthropic");
    assert!(events[1].success);
    assert!(!events[1].cached);
    assert_eq!(events[1].provider.as_str(), "openai");
    assert!(events[2].success);
    assert!(events[2].cached);
    assert_eq!(events[2].cost, 0.0);
}
