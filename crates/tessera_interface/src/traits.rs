//! Trait definitions for upstream backends and the durable ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::Stream;
use std::pin::Pin;
use tessera_core::{Account, Backend, ChatResponse, Message, Secret, StreamChunk, UsageRecord};
use tessera_error::{TesseraResult, UpstreamResult};

/// Lazy sequence of decoded text chunks from one upstream response.
///
/// Dropping the stream drops the underlying connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = UpstreamResult<StreamChunk>> + Send>>;

/// One upstream language-model service.
///
/// Adapters translate the canonical conversation into the backend's request
/// format and decode its responses. They hold no session state between calls.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which backend this adapter speaks to.
    fn backend(&self) -> Backend;

    /// Generate a complete response.
    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse>;

    /// Open a streaming response.
    ///
    /// Failures before the response starts are returned directly. Failures
    /// while reading are yielded by the stream.
    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream>;
}

/// Narrow read/update contract the credit ledger needs from durable storage.
///
/// Every mutating method must be a single atomic update in the store, not a
/// read-modify-write in the caller's process.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load an account, `None` when it does not exist.
    async fn account(&self, account_id: &str) -> TesseraResult<Option<Account>>;

    /// Start a new allowance window if nobody else already did.
    ///
    /// Resets `daily_consumed` to zero, sets `daily_allowance` and advances
    /// `allowance_reset_at` to `now`, but only while the stored reset boundary
    /// still equals `observed_reset_at`. Returns whether this call performed
    /// the reset.
    async fn reset_allowance(
        &self,
        account_id: &str,
        observed_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
        daily_allowance: u32,
    ) -> TesseraResult<bool>;

    /// Atomically add `amount` to `daily_consumed`, returning the updated account.
    async fn increment_consumed(
        &self,
        account_id: &str,
        amount: u32,
    ) -> TesseraResult<Option<Account>>;

    /// Append one usage record.
    async fn append_usage(&self, record: UsageRecord) -> TesseraResult<()>;
}
