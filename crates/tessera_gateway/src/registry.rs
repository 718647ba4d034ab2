//! Backend to adapter lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tessera_core::Backend;
use tessera_error::ConfigError;
use tessera_interface::ProviderAdapter;
use tessera_models::{
    AnthropicAdapter, GeminiAdapter, GroqAdapter, HuggingFaceAdapter, OpenAiAdapter,
    build_http_client,
};
use tessera_routing::HttpConfig;
use tracing::debug;

/// Adapters keyed by the backend they serve.
///
/// Failover and tier logic only ever see `dyn ProviderAdapter`; concrete
/// adapter types are named in exactly one place, [`AdapterRegistry::standard`].
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Backend, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// One real adapter per backend, sharing a single HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the HTTP client cannot be built.
    pub fn standard(http: &HttpConfig) -> Result<Self, ConfigError> {
        let client = build_http_client(
            Duration::from_secs(http.connect_timeout_secs),
            Duration::from_secs(http.read_timeout_secs),
        )?;
        let registry = Backend::iter().fold(Self::new(), |registry, backend| {
            let client = client.clone();
            let adapter: Arc<dyn ProviderAdapter> = match (backend, http.base_url(backend)) {
                (Backend::Anthropic, Some(url)) => {
                    Arc::new(AnthropicAdapter::with_base_url(client, url))
                }
                (Backend::Anthropic, None) => Arc::new(AnthropicAdapter::new(client)),
                (Backend::OpenAi, Some(url)) => Arc::new(OpenAiAdapter::with_base_url(client, url)),
                (Backend::OpenAi, None) => Arc::new(OpenAiAdapter::new(client)),
                (Backend::Gemini, Some(url)) => Arc::new(GeminiAdapter::with_base_url(client, url)),
                (Backend::Gemini, None) => Arc::new(GeminiAdapter::new(client)),
                (Backend::Groq, Some(url)) => Arc::new(GroqAdapter::with_base_url(client, url)),
                (Backend::Groq, None) => Arc::new(GroqAdapter::new(client)),
                (Backend::HuggingFace, Some(url)) => {
                    Arc::new(HuggingFaceAdapter::with_base_url(client, url))
                }
                (Backend::HuggingFace, None) => Arc::new(HuggingFaceAdapter::new(client)),
            };
            registry.with_adapter(adapter)
        });
        debug!(count = registry.adapters.len(), "Built standard adapter registry");
        Ok(registry)
    }

    /// Register (or replace) the adapter for its backend.
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.backend(), adapter);
        self
    }

    /// Adapter for a backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no adapter is registered for it.
    pub fn adapter(&self, backend: Backend) -> Result<Arc<dyn ProviderAdapter>, ConfigError> {
        self.adapters.get(&backend).cloned().ok_or_else(|| {
            ConfigError::new(format!("no adapter registered for backend {}", backend))
        })
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut backends: Vec<&Backend> = self.adapters.keys().collect();
        backends.sort();
        f.debug_struct("AdapterRegistry")
            .field("backends", &backends)
            .finish()
    }
}
