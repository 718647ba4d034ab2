//! Groq LPU inference adapter using the OpenAI-compatible client.

use crate::openai_compat::OpenAICompatibleClient;
use async_trait::async_trait;
use reqwest::Client;
use tessera_core::{Backend, ChatResponse, Message, Secret};
use tessera_error::UpstreamResult;
use tessera_interface::{ChunkStream, ProviderAdapter};
use tracing::instrument;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Groq adapter.
#[derive(Debug, Clone)]
pub struct GroqAdapter {
    inner: OpenAICompatibleClient,
}

impl GroqAdapter {
    /// Creates an adapter against the public Groq API.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GROQ_API_URL)
    }

    /// Creates an adapter against a custom root.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            inner: OpenAICompatibleClient::new(client, base_url, Backend::Groq.name()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GroqAdapter {
    fn backend(&self) -> Backend {
        Backend::Groq
    }

    #[instrument(skip_all, fields(provider = "groq"))]
    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        self.inner.complete(messages, model_id, credential).await
    }

    #[instrument(skip_all, fields(provider = "groq"))]
    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        self.inner.stream_complete(messages, model_id, credential).await
    }
}
