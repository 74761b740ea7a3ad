//! Capability matching: pure candidate ordering for a request.
//!
//! `candidates` never performs I/O. It combines a static task-preference
//! table, strong-hint splicing and the availability probe into a
//! first-eligible-wins ordering.

mod availability;

pub use availability::{AvailabilityProbe, EnvProbe, StaticProbe};

use crate::catalog::{ProviderCatalog, ProviderId, ProviderProfile};
use crate::types::{Hint, Request, TaskKind};
use crate::{Error, Result};
use std::sync::Arc;

/// Default provider preference per task kind, most-preferred first.
/// Reflects known per-task strengths; hints may still reorder.
fn task_preference(task: TaskKind) -> &'static [&'static str] {
    match task {
        TaskKind::Research => &["anthropic", "openai", "gemini"],
        TaskKind::Analysis => &["anthropic", "openai", "gemini"],
        TaskKind::Generation => &["openai", "anthropic", "gemini"],
        TaskKind::Question => &["openai", "gemini", "anthropic"],
        TaskKind::Summarization => &["gemini", "openai", "anthropic"],
    }
}

/// Strong hints promote one provider to the front of the order.
fn hint_preference(hint: Hint) -> &'static str {
    match hint {
        Hint::HasImagesOrVideo => "gemini",
        Hint::RequiresCompliance => "anthropic",
        Hint::RequiresLowLatency => "openai",
    }
}

// Fixed evaluation order so concurrent hints splice deterministically; the
// last applied hint ends up frontmost.
const HINT_ORDER: [Hint; 3] = [
    Hint::RequiresLowLatency,
    Hint::RequiresCompliance,
    Hint::HasImagesOrVideo,
];

pub struct CapabilityMatcher {
    catalog: Arc<ProviderCatalog>,
    probe: Arc<dyn AvailabilityProbe>,
}

impl CapabilityMatcher {
    pub fn new(catalog: Arc<ProviderCatalog>, probe: Arc<dyn AvailabilityProbe>) -> Self {
        Self { catalog, probe }
    }

    /// Ordered candidate list for `request`.
    ///
    /// An explicit provider override wins outright, bypassing hint ranking.
    /// An empty result is a configuration error, not a retryable failure.
    pub fn candidates(&self, request: &Request) -> Result<Vec<&ProviderProfile>> {
        if let Some(explicit) = &request.explicit_provider {
            let profile = self.catalog.get(explicit).ok_or_else(|| {
                Error::configuration(format!("unknown provider '{explicit}'"))
            })?;
            if !self.probe.is_configured(explicit) {
                return Err(Error::configuration(format!(
                    "provider '{explicit}' is not configured"
                )));
            }
            return Ok(vec![profile]);
        }

        let mut order: Vec<ProviderId> = task_preference(request.task)
            .iter()
            .map(|id| ProviderId::from(*id))
            .collect();

        for hint in HINT_ORDER {
            if request.context_hints.contains(&hint) {
                splice_front(&mut order, &ProviderId::from(hint_preference(hint)));
            }
        }

        let candidates: Vec<&ProviderProfile> = order
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .filter(|p| self.probe.is_configured(&p.id))
            .collect();

        if candidates.is_empty() {
            return Err(Error::configuration(format!(
                "no eligible provider for task '{}'",
                request.task
            )));
        }
        Ok(candidates)
    }
}

/// Move `id` to the front of `order`, preserving the relative order of the
/// rest. A missing id is inserted at the front.
fn splice_front(order: &mut Vec<ProviderId>, id: &ProviderId) {
    if let Some(pos) = order.iter().position(|p| p == id) {
        let found = order.remove(pos);
        order.insert(0, found);
    } else {
        order.insert(0, id.clone());
    }
}
