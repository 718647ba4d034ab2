//! Public capability tiers.

use serde::{Deserialize, Serialize};

/// Abstract capability label callers ask for.
///
/// Each tier is a stable public contract. The backend and model behind it are
/// configuration and may change without touching caller code.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use tessera_core::CapabilityTier;
///
/// assert_eq!(CapabilityTier::from_str("pro-smart").unwrap(), CapabilityTier::ProSmart);
/// assert_eq!(CapabilityTier::Fast.to_string(), "fast");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CapabilityTier {
    /// Highest capability model
    SuperSmart,
    /// High capability model, free for elevated plans
    ProSmart,
    /// General purpose model
    Normal,
    /// Latency-optimised model
    Fast,
}
