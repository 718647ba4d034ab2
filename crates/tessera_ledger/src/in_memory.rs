//! In-memory implementation of LedgerStore.
//!
//! Accounts and usage records live in maps protected by an RwLock. Every
//! mutation happens under a single write guard, which gives the same
//! atomicity a relational store provides with a conditional `UPDATE`. All
//! data is lost when the store is dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::{Account, UsageRecord};
use tessera_error::TesseraResult;
use tessera_interface::LedgerStore;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory ledger store.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use tessera_core::{Account, Plan};
/// use tessera_interface::LedgerStore;
/// use tessera_ledger::InMemoryLedgerStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = InMemoryLedgerStore::new();
/// store.insert_account(Account::new("acct-1", Plan::Free, 50, Utc::now())).await;
/// let account = store.account("acct-1").await.unwrap().unwrap();
/// assert_eq!(account.remaining(), 50);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    /// Accounts keyed by ID
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    /// Append-only usage trail
    usage: Arc<RwLock<Vec<UsageRecord>>>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub async fn insert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account);
    }

    /// Snapshot of the usage trail, oldest first.
    pub async fn usage_records(&self) -> Vec<UsageRecord> {
        self.usage.read().await.clone()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Check if the store has no accounts.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn account(&self, account_id: &str) -> TesseraResult<Option<Account>> {
        Ok(self.accounts.read().await.get(account_id).cloned())
    }

    async fn reset_allowance(
        &self,
        account_id: &str,
        observed_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
        daily_allowance: u32,
    ) -> TesseraResult<bool> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(account_id) else {
            return Ok(false);
        };
        if account.allowance_reset_at != observed_reset_at || now <= account.allowance_reset_at {
            debug!(account_id, "Reset already performed");
            return Ok(false);
        }
        account.daily_consumed = 0;
        account.daily_allowance = daily_allowance;
        account.allowance_reset_at = now;
        Ok(true)
    }

    async fn increment_consumed(
        &self,
        account_id: &str,
        amount: u32,
    ) -> TesseraResult<Option<Account>> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.get_mut(account_id).map(|account| {
            account.daily_consumed = account.daily_consumed.saturating_add(amount);
            account.clone()
        }))
    }

    async fn append_usage(&self, record: UsageRecord) -> TesseraResult<()> {
        self.usage.write().await.push(record);
        Ok(())
    }
}
