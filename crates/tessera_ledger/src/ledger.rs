//! Admission control and debiting.

use crate::pricing::request_cost;
use crate::reset::should_reset;
use crate::{Clock, SystemClock};
use std::sync::Arc;
use tessera_core::{Account, BackendBinding, CapabilityTier, Plan, PlanAccess, UsageRecord};
use tessera_error::{LedgerError, LedgerErrorKind, TesseraResult};
use tessera_interface::LedgerStore;
use tessera_routing::{LedgerConfig, TierResolver};
use tracing::{debug, info, instrument, warn};

/// Why a request was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DenialReason {
    /// Cost exceeds the credits left in the current window
    #[display("insufficient credits")]
    InsufficientCredits,
    /// Tier requires an elevated plan
    #[display("plan restricted")]
    PlanRestricted,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Whether the request may be dispatched
    pub allowed: bool,
    /// Credits the request costs
    pub cost: u32,
    /// Credits left in the current window, before this request
    pub remaining: u32,
    /// Set when `allowed` is false
    pub reason: Option<DenialReason>,
    /// Tier that was checked
    pub tier: CapabilityTier,
    /// Plan of the account
    pub plan: Plan,
}

impl Admission {
    /// Turn a denial into its classified error.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientCredits` or `PlanRestricted` when not allowed.
    pub fn into_result(self) -> Result<Self, LedgerError> {
        match self.reason {
            None if self.allowed => Ok(self),
            Some(DenialReason::PlanRestricted) => {
                Err(LedgerError::new(LedgerErrorKind::PlanRestricted {
                    tier: self.tier.to_string(),
                    plan: self.plan.to_string(),
                }))
            }
            _ => Err(LedgerError::new(LedgerErrorKind::InsufficientCredits {
                required: self.cost,
                remaining: self.remaining,
            })),
        }
    }
}

/// Per-account credit ledger.
///
/// Callers check admission before dispatch and debit once after a
/// successful completion. The ledger itself does not enforce that order.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use std::sync::Arc;
/// use tessera_core::{Account, CapabilityTier, Plan};
/// use tessera_ledger::{CreditLedger, InMemoryLedgerStore};
/// use tessera_routing::{TesseraConfig, TierResolver};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TesseraConfig::bundled()?;
/// let store = InMemoryLedgerStore::new();
/// store.insert_account(Account::new("acct-1", Plan::Free, 50, Utc::now())).await;
///
/// let ledger = CreditLedger::new(
///     Arc::new(store),
///     TierResolver::from_config(&config),
///     config.ledger,
/// );
/// let admission = ledger.check_admission("acct-1", CapabilityTier::Fast, 1000).await?;
/// assert!(admission.allowed);
/// assert_eq!(admission.cost, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    resolver: TierResolver,
    config: LedgerConfig,
}

impl std::fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CreditLedger {
    /// Create a ledger on the system clock.
    pub fn new(store: Arc<dyn LedgerStore>, resolver: TierResolver, config: LedgerConfig) -> Self {
        Self::with_clock(store, resolver, config, Arc::new(SystemClock))
    }

    /// Create a ledger on a specific clock.
    pub fn with_clock(
        store: Arc<dyn LedgerStore>,
        resolver: TierResolver,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            resolver,
            config,
        }
    }

    /// Check whether an account may run a request on a tier.
    ///
    /// Starts a new allowance window first when one is due.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts, or a store error.
    pub async fn check_admission(
        &self,
        account_id: &str,
        tier: CapabilityTier,
        estimated_workload: u32,
    ) -> TesseraResult<Admission> {
        let binding = self.resolver.resolve(tier).clone();
        self.check_admission_for(account_id, tier, &binding, estimated_workload)
            .await
    }

    /// Check admission against an explicit binding, as used by overrides.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts, or a store error.
    #[instrument(skip(self, binding), fields(backend = %binding.backend))]
    pub async fn check_admission_for(
        &self,
        account_id: &str,
        tier: CapabilityTier,
        binding: &BackendBinding,
        estimated_workload: u32,
    ) -> TesseraResult<Admission> {
        let account = self.load(account_id).await?;

        if account.plan == Plan::Unlimited {
            debug!("Unlimited plan bypasses allowance");
            return Ok(Admission {
                allowed: true,
                cost: 0,
                remaining: u32::MAX,
                reason: None,
                tier,
                plan: account.plan,
            });
        }

        let account = self.reset_if_due(account).await?;
        let remaining = account.remaining();

        let (allowed, cost, reason) = match binding.access_for(account.plan) {
            PlanAccess::Denied => (false, 0, Some(DenialReason::PlanRestricted)),
            PlanAccess::Free => (true, 0, None),
            PlanAccess::Metered => {
                let price = self.config.pricing.get(tier);
                let cost = request_cost(binding, price, estimated_workload);
                if cost <= remaining {
                    (true, cost, None)
                } else {
                    (false, cost, Some(DenialReason::InsufficientCredits))
                }
            }
        };

        if allowed {
            debug!(cost, remaining, "Request admitted");
        } else {
            warn!(cost, remaining, reason = ?reason, plan = %account.plan, "Request denied");
        }

        Ok(Admission {
            allowed,
            cost,
            remaining,
            reason,
            tier,
            plan: account.plan,
        })
    }

    /// Record a completed request.
    ///
    /// Unlimited accounts and free-for-plan tiers are charged nothing but
    /// still leave a usage record.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts, or a store error.
    pub async fn debit(
        &self,
        account_id: &str,
        cost: u32,
        feature: &str,
        tier: CapabilityTier,
    ) -> TesseraResult<UsageRecord> {
        let binding = self.resolver.resolve(tier).clone();
        self.debit_for(account_id, cost, feature, tier, &binding)
            .await
    }

    /// Record a completed request served by an explicit binding.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts, or a store error.
    #[instrument(skip(self, binding))]
    pub async fn debit_for(
        &self,
        account_id: &str,
        cost: u32,
        feature: &str,
        tier: CapabilityTier,
        binding: &BackendBinding,
    ) -> TesseraResult<UsageRecord> {
        let account = self.load(account_id).await?;
        let charged = match binding.access_for(account.plan) {
            PlanAccess::Free => 0,
            _ if account.plan == Plan::Unlimited => 0,
            _ => cost,
        };

        if charged > 0 {
            let updated = self
                .store
                .increment_consumed(account_id, charged)
                .await?
                .ok_or_else(|| not_found(account_id))?;
            info!(
                charged,
                consumed = updated.daily_consumed,
                allowance = updated.daily_allowance,
                "Debited account"
            );
        } else {
            debug!("Recording zero-cost usage");
        }

        let record = UsageRecord::new(account_id, feature, tier, charged, self.clock.now());
        self.store.append_usage(record.clone()).await?;
        Ok(record)
    }

    async fn load(&self, account_id: &str) -> TesseraResult<Account> {
        Ok(self
            .store
            .account(account_id)
            .await?
            .ok_or_else(|| not_found(account_id))?)
    }

    async fn reset_if_due(&self, account: Account) -> TesseraResult<Account> {
        let now = self.clock.now();
        if !should_reset(now, account.allowance_reset_at) {
            return Ok(account);
        }

        let allowance = self.config.allowances.for_plan(account.plan);
        let performed = self
            .store
            .reset_allowance(&account.id, account.allowance_reset_at, now, allowance)
            .await?;
        if performed {
            info!(
                account_id = %account.id,
                previous_reset = %account.allowance_reset_at,
                allowance,
                "Started new allowance window"
            );
        }
        self.load(&account.id).await
    }
}

fn not_found(account_id: &str) -> LedgerError {
    LedgerError::new(LedgerErrorKind::AccountNotFound(account_id.to_string()))
}
