//! Fallback progression over a candidate list.
//!
//! A chain hands out candidates strictly in order and never revisits one:
//! the cursor only moves forward, so a provider attempted for a logical
//! request is not attempted again for it.

use crate::catalog::ProviderProfile;

pub(crate) struct FallbackChain<'a> {
    candidates: &'a [&'a ProviderProfile],
    next: usize,
}

impl<'a> FallbackChain<'a> {
    pub(crate) fn new(candidates: &'a [&'a ProviderProfile]) -> Self {
        Self {
            candidates,
            next: 0,
        }
    }

    /// Next untried candidate, or `None` when the chain is exhausted.
    pub(crate) fn advance(&mut self) -> Option<&'a ProviderProfile> {
        let candidate = self.candidates.get(self.next)?;
        self.next += 1;
        Some(candidate)
    }

    pub(crate) fn attempted(&self) -> usize {
        self.next
    }
}
