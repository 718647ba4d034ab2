//! OpenAI Chat Completions adapter.

use crate::openai_compat::OpenAICompatibleClient;
use async_trait::async_trait;
use reqwest::Client;
use tessera_core::{Backend, ChatResponse, Message, Secret};
use tessera_error::UpstreamResult;
use tessera_interface::{ChunkStream, ProviderAdapter};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI adapter.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    inner: OpenAICompatibleClient,
}

impl OpenAiAdapter {
    /// Creates an adapter against the public OpenAI API.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OPENAI_API_URL)
    }

    /// Creates an adapter against another OpenAI-compatible root.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            inner: OpenAICompatibleClient::new(client, base_url, Backend::OpenAi.name()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn backend(&self) -> Backend {
        Backend::OpenAi
    }

    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        self.inner.complete(messages, model_id, credential).await
    }

    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        self.inner.stream_complete(messages, model_id, credential).await
    }
}
