use crate::catalog::ProviderId;
use serde::{Deserialize, Serialize};

/// Normalized result of one successful execution. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub provider: ProviderId,
    pub model: String,
    /// Character-count heuristic, roughly 4 chars per token.
    pub tokens_estimated: u32,
    pub cost_estimated: f64,
    pub latency_ms: u64,
    pub served_from_cache: bool,
}
