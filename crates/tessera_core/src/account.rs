//! Accounts and the append-only usage trail.

use crate::CapabilityTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription class of an account.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Plan {
    /// Base plan with a small daily allowance
    Free,
    /// Elevated plan
    Pro,
    /// Elevated plan that bypasses allowance checks
    Unlimited,
}

impl Plan {
    /// Whether this plan unlocks elevated-only tiers.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Plan::Pro | Plan::Unlimited)
    }
}

/// Allowance state of one account, as stored durably.
///
/// `daily_consumed` never goes negative and `allowance_reset_at` only moves
/// forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: String,
    /// Subscription class
    pub plan: Plan,
    /// Credits granted per window
    pub daily_allowance: u32,
    /// Credits consumed in the current window
    pub daily_consumed: u32,
    /// Start of the current window
    pub allowance_reset_at: DateTime<Utc>,
}

impl Account {
    /// Create an account whose window starts at `now`.
    pub fn new(
        id: impl Into<String>,
        plan: Plan,
        daily_allowance: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            plan,
            daily_allowance,
            daily_consumed: 0,
            allowance_reset_at: now,
        }
    }

    /// Credits left in the current window.
    pub fn remaining(&self) -> u32 {
        self.daily_allowance.saturating_sub(self.daily_consumed)
    }
}

/// One completed request, written once and never read for admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Record identifier
    pub id: Uuid,
    /// Account charged
    pub account_id: String,
    /// Product feature that made the request
    pub feature: String,
    /// Tier that served the request
    pub tier_used: CapabilityTier,
    /// Credits charged, zero for free usage
    pub credits_charged: u32,
    /// When the debit happened
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a record with a fresh identifier.
    pub fn new(
        account_id: impl Into<String>,
        feature: impl Into<String>,
        tier_used: CapabilityTier,
        credits_charged: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            feature: feature.into(),
            tier_used,
            credits_charged,
            timestamp,
        }
    }
}
