//! Caller-facing chat and stream operations.

use crate::{AdapterRegistry, FailoverController, TextStream};
use std::time::Duration;
use tessera_core::{BackendBinding, CapabilityTier, ChatResponse, Message, validate_conversation};
use tessera_error::TesseraResult;
use tessera_routing::{Credentials, RetryPolicy, TesseraConfig, TierResolver};
use tracing::{debug, instrument};

/// One provider-agnostic chat request.
///
/// # Examples
///
/// ```
/// use tessera_core::{CapabilityTier, Message};
/// use tessera_gateway::ChatRequest;
///
/// let request = ChatRequest::new(CapabilityTier::Fast, vec![Message::user("Hi")]);
/// assert!(request.binding_override.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Requested capability tier
    pub tier: CapabilityTier,
    /// The conversation, with at most one system message
    pub messages: Vec<Message>,
    /// Explicit binding that bypasses tier resolution
    pub binding_override: Option<BackendBinding>,
}

impl ChatRequest {
    /// Create a request for a tier.
    pub fn new(tier: CapabilityTier, messages: Vec<Message>) -> Self {
        Self {
            tier,
            messages,
            binding_override: None,
        }
    }

    /// Route the request to an explicit binding instead of the tier's.
    pub fn with_binding_override(mut self, binding: BackendBinding) -> Self {
        self.binding_override = Some(binding);
        self
    }
}

/// The gateway: tier resolution plus failover-protected dispatch.
///
/// Construct one per configuration; instances share nothing, so tests can
/// build isolated gateways over mock adapters.
///
/// # Example
///
/// ```no_run
/// use tessera_core::{CapabilityTier, Message};
/// use tessera_gateway::{ChatRequest, Gateway};
/// use tessera_routing::TesseraConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::from_config(&TesseraConfig::load()?)?;
/// let request = ChatRequest::new(CapabilityTier::Fast, vec![Message::user("Hello")]);
/// let response = gateway.chat(&request).await?;
/// println!("{}", response.content);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Gateway {
    resolver: TierResolver,
    failover: FailoverController,
}

impl Gateway {
    /// Create a gateway over explicit adapters and credentials.
    pub fn new(config: &TesseraConfig, registry: AdapterRegistry, credentials: Credentials) -> Self {
        let failover = FailoverController::new(
            registry,
            credentials,
            RetryPolicy::from_config(&config.retry),
            Duration::from_secs(config.retry.attempt_timeout_secs),
            config.fallback.clone(),
        )
        .with_idle_timeout(Duration::from_secs(config.http.read_timeout_secs));
        Self {
            resolver: TierResolver::from_config(config),
            failover,
        }
    }

    /// Create a gateway with the standard adapters and process credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &TesseraConfig) -> TesseraResult<Self> {
        let registry = AdapterRegistry::standard(&config.http)?;
        Ok(Self::new(config, registry, Credentials::from_env()))
    }

    /// The tier resolver in use.
    pub fn resolver(&self) -> &TierResolver {
        &self.resolver
    }

    /// The binding a request will be dispatched to first.
    pub fn binding_for<'a>(&'a self, request: &'a ChatRequest) -> &'a BackendBinding {
        request
            .binding_override
            .as_ref()
            .unwrap_or_else(|| self.resolver.resolve(request.tier))
    }

    /// Generate a complete answer.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error for malformed conversations, or the
    /// classified upstream, service-unavailable or configuration error.
    #[instrument(skip(self, request), fields(tier = %request.tier))]
    pub async fn chat(&self, request: &ChatRequest) -> TesseraResult<ChatResponse> {
        validate_conversation(&request.messages)?;
        let binding = self.binding_for(request);
        debug!(backend = %binding.backend, model = %binding.model_id, "Dispatching chat");
        self.failover.execute(binding, &request.messages).await
    }

    /// Stream an answer as text chunks.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::chat`], for failures before the first chunk.
    /// Later failures end the returned stream.
    #[instrument(skip(self, request), fields(tier = %request.tier))]
    pub async fn stream(&self, request: &ChatRequest) -> TesseraResult<TextStream> {
        validate_conversation(&request.messages)?;
        let binding = self.binding_for(request);
        debug!(backend = %binding.backend, model = %binding.model_id, "Dispatching stream");
        self.failover
            .execute_stream(binding, &request.messages)
            .await
    }
}
