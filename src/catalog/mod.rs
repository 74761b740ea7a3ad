//! Static provider registry: identities, models, capabilities and budgets.
//!
//! The catalog is loaded once at router construction and never mutated at
//! runtime, so it is shared without locks.

use crate::types::Hint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Provider identifier, e.g. `"openai"` or `"anthropic"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Wire dialect the provider speaks. Selects the payload adapter; adding a
/// provider with an existing style needs no new adapter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    OpenAi,
    Anthropic,
    Gemini,
}

/// Static description of one upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub api_style: ApiStyle,
    /// Preferred-first. The first entry is the default model.
    pub supported_models: Vec<String>,
    pub capabilities: HashSet<Hint>,
    pub max_context_tokens: u32,
    /// Request budget per 60-second window. Zero means unlimited.
    pub requests_per_minute: u32,
    pub cost_per_thousand_tokens: f64,
    pub default_timeout: Duration,
    /// Transport-level retry count; higher for flakier upstreams.
    pub transport_retries: u32,
    /// Logical endpoint path handed to the injected transport.
    pub endpoint_path: String,
}

impl ProviderProfile {
    pub fn default_model(&self) -> Option<&str> {
        self.supported_models.first().map(String::as_str)
    }

    pub fn supports(&self, hint: Hint) -> bool {
        self.capabilities.contains(&hint)
    }
}

/// Read-only registry of known providers. Order is insertion order.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderProfile>,
}

impl ProviderCatalog {
    pub fn new(providers: Vec<ProviderProfile>) -> Self {
        Self { providers }
    }

    /// Catalog of the three stock provider profiles.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn get(&self, id: &ProviderId) -> Option<&ProviderProfile> {
        self.providers.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &ProviderId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

static BUILTIN: Lazy<ProviderCatalog> = Lazy::new(|| {
    ProviderCatalog::new(vec![
        ProviderProfile {
            id: ProviderId::from("openai"),
            api_style: ApiStyle::OpenAi,
            supported_models: vec!["gpt-4o".into(), "gpt-4o-mini".into()],
            capabilities: [Hint::HasImagesOrVideo, Hint::RequiresLowLatency]
                .into_iter()
                .collect(),
            max_context_tokens: 128_000,
            requests_per_minute: 500,
            cost_per_thousand_tokens: 0.01,
            default_timeout: Duration::from_secs(30),
            transport_retries: 2,
            endpoint_path: "/v1/chat/completions".into(),
        },
        ProviderProfile {
            id: ProviderId::from("anthropic"),
            api_style: ApiStyle::Anthropic,
            supported_models: vec!["claude-sonnet-4-20250514".into(), "claude-3-5-haiku".into()],
            capabilities: [Hint::RequiresCompliance].into_iter().collect(),
            max_context_tokens: 200_000,
            requests_per_minute: 300,
            cost_per_thousand_tokens: 0.015,
            default_timeout: Duration::from_secs(45),
            transport_retries: 2,
            endpoint_path: "/v1/messages".into(),
        },
        ProviderProfile {
            id: ProviderId::from("gemini"),
            api_style: ApiStyle::Gemini,
            supported_models: vec!["gemini-1.5-pro".into(), "gemini-1.5-flash".into()],
            capabilities: [Hint::HasImagesOrVideo].into_iter().collect(),
            max_context_tokens: 1_000_000,
            requests_per_minute: 360,
            cost_per_thousand_tokens: 0.007,
            // Flakier transport in practice, hence the extra retry.
            default_timeout: Duration::from_secs(30),
            transport_retries: 3,
            endpoint_path: "/v1beta/models/{model}:generateContent".into(),
        },
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = ProviderCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        let openai = catalog.get(&ProviderId::from("openai")).unwrap();
        assert_eq!(openai.default_model(), Some("gpt-4o"));
        assert!(openai.supports(Hint::HasImagesOrVideo));
        assert!(!catalog.contains(&ProviderId::from("nonexistent")));
    }

    #[test]
    fn test_profile_budget_fields() {
        let catalog = ProviderCatalog::builtin();
        for profile in catalog.iter() {
            assert!(profile.requests_per_minute > 0);
            assert!(profile.cost_per_thousand_tokens > 0.0);
            assert!(!profile.endpoint_path.is_empty());
        }
    }
}
