//! Availability signal: which providers have credentials configured.

use crate::catalog::ProviderId;
use std::collections::HashSet;

/// Answers whether a provider can actually be called. Consulted by the
/// matcher to exclude providers lacking credentials.
pub trait AvailabilityProbe: Send + Sync {
    fn is_configured(&self, provider: &ProviderId) -> bool;
}

/// Checks the conventional `{PROVIDER}_API_KEY` environment variable.
#[derive(Debug, Default)]
pub struct EnvProbe;

impl EnvProbe {
    pub fn new() -> Self {
        Self
    }
}

impl AvailabilityProbe for EnvProbe {
    fn is_configured(&self, provider: &ProviderId) -> bool {
        let var = format!("{}_API_KEY", provider.as_str().to_uppercase());
        std::env::var(&var).map(|v| !v.is_empty()).unwrap_or(false)
    }
}

/// Fixed answer set, mainly for tests and embedded configuration.
#[derive(Debug)]
pub struct StaticProbe {
    configured: Option<HashSet<ProviderId>>,
}

impl StaticProbe {
    /// Every provider reports as configured.
    pub fn all() -> Self {
        Self { configured: None }
    }

    /// No provider is configured.
    pub fn none() -> Self {
        Self {
            configured: Some(HashSet::new()),
        }
    }

    /// Exactly the named providers are configured.
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        Self {
            configured: Some(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl AvailabilityProbe for StaticProbe {
    fn is_configured(&self, provider: &ProviderId) -> bool {
        match &self.configured {
            None => true,
            Some(set) => set.contains(provider),
        }
    }
}
