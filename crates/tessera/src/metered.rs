//! Admission, dispatch and debit as one metered operation.

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use tessera_core::{ChatResponse, StreamChunk, UsageRecord, estimate_workload};
use tessera_error::{TesseraError, TesseraResult};
use tessera_gateway::{ChatRequest, Gateway};
use tessera_ledger::{Admission, CreditLedger};
use tracing::{debug, info, instrument, warn};

/// Text chunks of a metered stream.
///
/// The account is debited once, after the upstream stream ends normally.
/// A stream that errors or is dropped early is never charged.
pub type MeteredStream = Pin<Box<dyn Stream<Item = TesseraResult<StreamChunk>> + Send>>;

/// A completed metered chat.
#[derive(Debug, Clone)]
pub struct MeteredResponse {
    /// Generated answer
    pub response: ChatResponse,
    /// The admission decision the request ran under
    pub admission: Admission,
    /// The usage record written for the request
    pub usage: UsageRecord,
}

/// Gateway wrapped in per-account credit metering.
///
/// Every request is checked against the account's allowance before any
/// upstream call is made, and charged only after it succeeds. Denied
/// requests never reach a backend and never consume quota.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tessera::{
///     CapabilityTier, ChatRequest, CreditLedger, Gateway, InMemoryLedgerStore, Message,
///     MeteredGateway, TesseraConfig, TierResolver,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TesseraConfig::load()?;
/// let ledger = CreditLedger::new(
///     Arc::new(InMemoryLedgerStore::new()),
///     TierResolver::from_config(&config),
///     config.ledger,
/// );
/// let metered = MeteredGateway::new(Gateway::from_config(&config)?, ledger);
///
/// let request = ChatRequest::new(CapabilityTier::Fast, vec![Message::user("Hi")]);
/// let result = metered.chat("account-1", "chat", &request).await?;
/// println!("{} ({} credits)", result.response.content, result.usage.credits_charged);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MeteredGateway {
    gateway: Gateway,
    ledger: CreditLedger,
}

impl MeteredGateway {
    /// Combine a gateway with a ledger.
    pub fn new(gateway: Gateway, ledger: CreditLedger) -> Self {
        Self { gateway, ledger }
    }

    /// The wrapped gateway.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// The wrapped ledger.
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Check admission for a request without dispatching it.
    ///
    /// # Errors
    ///
    /// Returns a ledger error for unknown accounts or store failures. A
    /// denial is not an error here; inspect [`Admission::allowed`].
    pub async fn quote(&self, account_id: &str, request: &ChatRequest) -> TesseraResult<Admission> {
        let binding = self.gateway.binding_for(request);
        self.ledger
            .check_admission_for(
                account_id,
                request.tier,
                binding,
                estimate_workload(&request.messages),
            )
            .await
    }

    /// Admit, dispatch and debit one chat request.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientCredits` or `PlanRestricted` when admission is
    /// denied, otherwise whatever [`Gateway::chat`] or the ledger reports.
    #[instrument(skip(self, request), fields(tier = %request.tier))]
    pub async fn chat(
        &self,
        account_id: &str,
        feature: &str,
        request: &ChatRequest,
    ) -> TesseraResult<MeteredResponse> {
        let admission = self.quote(account_id, request).await?.into_result()?;
        let response = self.gateway.chat(request).await?;

        let binding = self.gateway.binding_for(request);
        let usage = self
            .ledger
            .debit_for(account_id, admission.cost, feature, request.tier, binding)
            .await?;
        info!(credits = usage.credits_charged, "Metered chat completed");

        Ok(MeteredResponse {
            response,
            admission,
            usage,
        })
    }

    /// Admit and dispatch one streamed request.
    ///
    /// Failures before the first chunk are returned here. Later failures end
    /// the stream with an error item and skip the debit.
    ///
    /// # Errors
    ///
    /// Same as [`MeteredGateway::chat`], for failures before any output.
    #[instrument(skip(self, request), fields(tier = %request.tier))]
    pub async fn stream(
        &self,
        account_id: &str,
        feature: &str,
        request: &ChatRequest,
    ) -> TesseraResult<MeteredStream> {
        let admission = self.quote(account_id, request).await?.into_result()?;
        let mut chunks = self.gateway.stream(request).await?;

        let ledger = self.ledger.clone();
        let binding = self.gateway.binding_for(request).clone();
        let account_id = account_id.to_string();
        let feature = feature.to_string();
        let tier = request.tier;

        Ok(Box::pin(stream! {
            while let Some(item) = chunks.next().await {
                match item {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => {
                        warn!(error = %e, "Stream ended with error, not debiting");
                        yield Err(TesseraError::from(e));
                        return;
                    }
                }
            }

            match ledger
                .debit_for(&account_id, admission.cost, &feature, tier, &binding)
                .await
            {
                Ok(usage) => debug!(credits = usage.credits_charged, "Metered stream completed"),
                Err(e) => yield Err(e),
            }
        }))
    }
}
