use crate::catalog::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Category of work requested. Drives the default provider preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Research,
    Analysis,
    Generation,
    Question,
    Summarization,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Research => "research",
            TaskKind::Analysis => "analysis",
            TaskKind::Generation => "generation",
            TaskKind::Question => "question",
            TaskKind::Summarization => "summarization",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context hints attached to a request. Strong hints reorder the candidate
/// list; they also describe provider capabilities in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hint {
    HasImagesOrVideo,
    RequiresCompliance,
    RequiresLowLatency,
}

/// Request priority. Carried through to telemetry; the router itself does not
/// reorder work by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// One logical unit of work for the router. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub task: TaskKind,
    pub prompt: String,
    /// Optional system prompt. Providers without a system role get it
    /// prefixed into the user message by their adapter.
    pub system_prompt: Option<String>,
    pub context_hints: HashSet<Hint>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    /// Explicit override: bypasses capability matching entirely.
    pub explicit_provider: Option<ProviderId>,
    pub explicit_model: Option<String>,
    pub cache_key: Option<String>,
    pub cache_ttl: Option<Duration>,
    pub priority: Priority,
    /// Total budget for the whole fallback chain, and the per-attempt
    /// transport timeout. Falls back to the provider default when unset.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(task: TaskKind, prompt: impl Into<String>) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            system_prompt: None,
            context_hints: HashSet::new(),
            max_tokens: None,
            temperature: None,
            explicit_provider: None,
            explicit_model: None,
            cache_key: None,
            cache_ttl: None,
            priority: Priority::default(),
            timeout: None,
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn hint(mut self, hint: Hint) -> Self {
        self.context_hints.insert(hint);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.explicit_provider = Some(provider.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.explicit_model = Some(model.into());
        self
    }

    /// Enable response caching under `key` with the given TTL.
    pub fn cached(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.cache_key = Some(key.into());
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
