//! Tessera - a unified AI gateway.
//!
//! Tessera accepts a provider-agnostic chat or stream request for a public
//! capability tier, routes it to one of five upstream language-model
//! services, retries throttled calls, fails over once to a high-availability
//! backend, and gates every call behind a per-account daily credit ledger.
//!
//! # Features
//!
//! - **Tiered routing**: `super-smart`, `pro-smart`, `normal` and `fast` map to
//!   configurable backend bindings
//! - **Five backends**: Anthropic, OpenAI, Gemini, Groq and HuggingFace
//! - **Retry and failover**: exponential backoff on throttling, one hop to the
//!   fallback backend on transient failure
//! - **Uniform streaming**: one lazy text stream whatever the upstream framing
//! - **Credit metering**: admission before dispatch, debit after completion
//!
//! # Quick Start
//!
//! ```no_run
//! use tessera::{CapabilityTier, ChatRequest, Gateway, Message, TesseraConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TesseraConfig::load()?;
//! let gateway = Gateway::from_config(&config)?;
//!
//! let request = ChatRequest::new(CapabilityTier::Fast, vec![Message::user("Hello!")]);
//! let response = gateway.chat(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! - `otel` - OpenTelemetry span and metric export to stdout
//! - `api` - enable tests that call real provider APIs
//!
//! # Architecture
//!
//! - `tessera_error` - error taxonomy
//! - `tessera_core` - data model
//! - `tessera_interface` - `ProviderAdapter` and `LedgerStore` traits
//! - `tessera_routing` - configuration, credentials, tier resolver, retry policy
//! - `tessera_models` - provider adapters
//! - `tessera_ledger` - credit ledger
//! - `tessera_gateway` - failover controller, stream normalizer, gateway
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod metered;
mod observability;

pub use metered::{MeteredGateway, MeteredResponse, MeteredStream};
pub use observability::{ObservabilityConfig, ObservabilityGuard, init_observability};

pub use tessera_core::{
    Account, Backend, BackendBinding, CapabilityTier, ChatResponse, CredentialRef, Message, Plan,
    PlanAccess, Role, Secret, StreamChunk, UsageRecord, estimate_workload, split_system,
    validate_conversation,
};
pub use tessera_error::{
    ConfigError, InvalidRequestError, LedgerError, LedgerErrorKind, RetryableError,
    ServiceUnavailableError, TesseraError, TesseraErrorKind, TesseraResult, UpstreamError,
    UpstreamErrorKind, UpstreamResult,
};
pub use tessera_gateway::{
    AdapterRegistry, ChatRequest, FailoverController, Gateway, GatewayMetrics, TextStream,
};
pub use tessera_interface::{ChunkStream, LedgerStore, ProviderAdapter};
pub use tessera_ledger::{
    Admission, Clock, CreditLedger, DenialReason, InMemoryLedgerStore, ManualClock, SystemClock,
    should_reset,
};
pub use tessera_models::{
    AnthropicAdapter, GeminiAdapter, GroqAdapter, HuggingFaceAdapter, OpenAiAdapter,
};
pub use tessera_routing::{
    Credentials, HttpConfig, LedgerConfig, PlanAllowances, PricingTable, RetryConfig,
    RetryPolicy, TesseraConfig, TierPrice, TierResolver,
};
