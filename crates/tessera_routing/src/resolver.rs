//! Tier to backend resolution.

use crate::{TesseraConfig, TierTable};
use strum::IntoEnumIterator;
use tessera_core::{BackendBinding, CapabilityTier};

/// Pure mapping from public tier to concrete backend binding.
///
/// Every tier resolves to exactly one binding for the lifetime of the
/// resolver. There is no load balancing within a tier. Plan restrictions on a
/// binding are enforced by the credit ledger, not here.
///
/// # Examples
///
/// ```
/// use tessera_core::{Backend, CapabilityTier};
/// use tessera_routing::{TesseraConfig, TierResolver};
///
/// let config = TesseraConfig::bundled().unwrap();
/// let resolver = TierResolver::from_config(&config);
/// assert_eq!(resolver.resolve(CapabilityTier::Fast).backend, Backend::Groq);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierResolver {
    tiers: TierTable,
}

impl TierResolver {
    /// Create a resolver over a tier table.
    pub fn new(tiers: TierTable) -> Self {
        Self { tiers }
    }

    /// Create a resolver from loaded configuration.
    pub fn from_config(config: &TesseraConfig) -> Self {
        Self::new(config.tiers.clone())
    }

    /// Binding currently backing a tier.
    pub fn resolve(&self, tier: CapabilityTier) -> &BackendBinding {
        self.tiers.get(tier)
    }

    /// All tiers with their bindings, in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = (CapabilityTier, &BackendBinding)> {
        CapabilityTier::iter().map(move |tier| (tier, self.tiers.get(tier)))
    }
}
