//! Credit ledger behavior against the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera_core::{Account, Backend, BackendBinding, CapabilityTier, Plan, UsageRecord};
use tessera_error::{LedgerErrorKind, TesseraResult};
use tessera_interface::LedgerStore;
use tessera_ledger::{CreditLedger, DenialReason, InMemoryLedgerStore, ManualClock};
use tessera_routing::{TesseraConfig, TierResolver};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn ledger_over(store: Arc<dyn LedgerStore>, clock: ManualClock) -> CreditLedger {
    let config = TesseraConfig::bundled().unwrap();
    CreditLedger::with_clock(
        store,
        TierResolver::from_config(&config),
        config.ledger,
        Arc::new(clock),
    )
}

async fn setup(account: Account) -> (CreditLedger, InMemoryLedgerStore, ManualClock) {
    let store = InMemoryLedgerStore::new();
    store.insert_account(account).await;
    let clock = ManualClock::new(start());
    let ledger = ledger_over(Arc::new(store.clone()), clock.clone());
    (ledger, store, clock)
}

#[tokio::test]
async fn test_unlimited_always_admitted_at_zero_cost() {
    let mut account = Account::new("u", Plan::Unlimited, 0, start());
    account.daily_consumed = 10_000;
    let (ledger, _, _) = setup(account).await;

    for tier in [CapabilityTier::SuperSmart, CapabilityTier::ProSmart, CapabilityTier::Fast] {
        let admission = ledger.check_admission("u", tier, 1_000_000).await.unwrap();
        assert!(admission.allowed);
        assert_eq!(admission.cost, 0);
    }
}

#[tokio::test]
async fn test_one_credit_short_is_denied() {
    let mut account = Account::new("a", Plan::Free, 50, start());
    account.daily_consumed = 49;
    let (ledger, store, _) = setup(account).await;

    let admission = ledger
        .check_admission("a", CapabilityTier::Fast, 10)
        .await
        .unwrap();

    assert!(!admission.allowed);
    assert_eq!(admission.cost, 3);
    assert_eq!(admission.remaining, 1);
    assert_eq!(admission.reason, Some(DenialReason::InsufficientCredits));

    let err = admission.into_result().unwrap_err();
    assert!(matches!(
        err.kind,
        LedgerErrorKind::InsufficientCredits { required: 3, remaining: 1 }
    ));
    assert!(store.usage_records().await.is_empty());
    assert_eq!(store.account("a").await.unwrap().unwrap().daily_consumed, 49);
}

#[tokio::test]
async fn test_fast_tier_end_to_end() {
    let (ledger, store, _) = setup(Account::new("a", Plan::Free, 50, start())).await;

    let admission = ledger
        .check_admission("a", CapabilityTier::Fast, 1000)
        .await
        .unwrap();
    assert!(admission.allowed);
    assert_eq!(admission.cost, 3);

    let record = ledger
        .debit("a", admission.cost, "chat", CapabilityTier::Fast)
        .await
        .unwrap();
    assert_eq!(record.credits_charged, 3);
    assert_eq!(store.account("a").await.unwrap().unwrap().daily_consumed, 3);
    assert_eq!(store.usage_records().await.len(), 1);
}

#[tokio::test]
async fn test_window_resets_after_24_hours() {
    let mut account = Account::new("a", Plan::Free, 50, start());
    account.daily_consumed = 50;
    let (ledger, store, clock) = setup(account).await;

    clock.advance(TimeDelta::hours(23));
    let admission = ledger
        .check_admission("a", CapabilityTier::Fast, 1)
        .await
        .unwrap();
    assert!(!admission.allowed);

    clock.advance(TimeDelta::hours(2));
    let admission = ledger
        .check_admission("a", CapabilityTier::Fast, 1)
        .await
        .unwrap();
    assert!(admission.allowed);
    assert_eq!(admission.remaining, 50);

    let stored = store.account("a").await.unwrap().unwrap();
    assert_eq!(stored.daily_consumed, 0);
    assert_eq!(stored.allowance_reset_at, start() + TimeDelta::hours(25));
}

#[tokio::test]
async fn test_clock_moving_backwards_never_resets() {
    let mut account = Account::new("a", Plan::Free, 50, start());
    account.daily_consumed = 50;
    let (ledger, store, clock) = setup(account).await;

    clock.advance(TimeDelta::days(-3));
    let admission = ledger
        .check_admission("a", CapabilityTier::Fast, 1)
        .await
        .unwrap();
    assert!(!admission.allowed);
    assert_eq!(
        store.account("a").await.unwrap().unwrap().allowance_reset_at,
        start()
    );
}

/// Store wrapper counting resets that actually took effect.
struct CountingStore {
    inner: InMemoryLedgerStore,
    resets: AtomicUsize,
}

#[async_trait]
impl LedgerStore for CountingStore {
    async fn account(&self, account_id: &str) -> TesseraResult<Option<Account>> {
        self.inner.account(account_id).await
    }

    async fn reset_allowance(
        &self,
        account_id: &str,
        observed_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
        daily_allowance: u32,
    ) -> TesseraResult<bool> {
        let performed = self
            .inner
            .reset_allowance(account_id, observed_reset_at, now, daily_allowance)
            .await?;
        if performed {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
        Ok(performed)
    }

    async fn increment_consumed(
        &self,
        account_id: &str,
        amount: u32,
    ) -> TesseraResult<Option<Account>> {
        self.inner.increment_consumed(account_id, amount).await
    }

    async fn append_usage(&self, record: UsageRecord) -> TesseraResult<()> {
        self.inner.append_usage(record).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_reset_once() {
    let inner = InMemoryLedgerStore::new();
    let mut account = Account::new("a", Plan::Pro, 500, start());
    account.daily_consumed = 400;
    inner.insert_account(account).await;

    let store = Arc::new(CountingStore {
        inner: inner.clone(),
        resets: AtomicUsize::new(0),
    });
    let clock = ManualClock::new(start() + TimeDelta::hours(30));
    let ledger = ledger_over(store.clone(), clock);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .check_admission("a", CapabilityTier::Normal, 100)
                    .await
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        let admission = handle.await.unwrap();
        assert!(admission.allowed);
        assert_eq!(admission.remaining, 500);
    }

    assert_eq!(store.resets.load(Ordering::SeqCst), 1);
    let stored = inner.account("a").await.unwrap().unwrap();
    assert_eq!(stored.daily_consumed, 0);
    assert_eq!(stored.allowance_reset_at, start() + TimeDelta::hours(30));
}

#[tokio::test]
async fn test_pro_smart_restricted_for_free_plan() {
    let (ledger, _, _) = setup(Account::new("a", Plan::Free, 50, start())).await;

    let admission = ledger
        .check_admission("a", CapabilityTier::ProSmart, 10)
        .await
        .unwrap();
    assert!(!admission.allowed);
    assert_eq!(admission.reason, Some(DenialReason::PlanRestricted));
    assert!(matches!(
        admission.into_result().unwrap_err().kind,
        LedgerErrorKind::PlanRestricted { .. }
    ));
}

#[tokio::test]
async fn test_pro_smart_free_for_pro_plan_with_audit_record() {
    let mut account = Account::new("p", Plan::Pro, 500, start());
    account.daily_consumed = 500;
    let (ledger, store, _) = setup(account).await;

    let admission = ledger
        .check_admission("p", CapabilityTier::ProSmart, 50_000)
        .await
        .unwrap();
    assert!(admission.allowed);
    assert_eq!(admission.cost, 0);

    let record = ledger
        .debit("p", 7, "podcast", CapabilityTier::ProSmart)
        .await
        .unwrap();
    assert_eq!(record.credits_charged, 0);
    assert_eq!(store.account("p").await.unwrap().unwrap().daily_consumed, 500);
    assert_eq!(store.usage_records().await.len(), 1);
}

#[tokio::test]
async fn test_unlimited_debit_writes_zero_cost_record() {
    let (ledger, store, _) = setup(Account::new("u", Plan::Unlimited, 0, start())).await;

    let record = ledger
        .debit("u", 12, "quiz", CapabilityTier::SuperSmart)
        .await
        .unwrap();
    assert_eq!(record.credits_charged, 0);
    assert_eq!(record.tier_used, CapabilityTier::SuperSmart);
    assert_eq!(store.account("u").await.unwrap().unwrap().daily_consumed, 0);
}

#[tokio::test]
async fn test_unknown_account() {
    let (ledger, store, _) = setup(Account::new("a", Plan::Free, 50, start())).await;

    let err = ledger
        .check_admission("missing", CapabilityTier::Fast, 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err.ledger_kind(),
        Some(LedgerErrorKind::AccountNotFound(id)) if id == "missing"
    ));

    assert!(ledger.debit("missing", 3, "chat", CapabilityTier::Fast).await.is_err());
    assert!(store.usage_records().await.is_empty());
}

#[tokio::test]
async fn test_override_binding_uses_its_own_access_rule() {
    let (ledger, _, _) = setup(Account::new("a", Plan::Free, 50, start())).await;
    let binding =
        BackendBinding::new(Backend::HuggingFace, "mistralai/Mistral-7B", "HUGGINGFACE_API_KEY");

    let admission = ledger
        .check_admission_for("a", CapabilityTier::Normal, &binding, 2000)
        .await
        .unwrap();
    assert!(admission.allowed);
    assert_eq!(admission.cost, 5);
}
