use super::dto::{GenerationParameters, TextGenerationRequest, TextGenerationResponse};
use crate::emulation::emulated_stream;
use crate::http::{self, protocol_error};
use async_trait::async_trait;
use reqwest::Client;
use tessera_core::{Backend, ChatResponse, Message, Role, Secret, split_system};
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::{ChunkStream, ProviderAdapter};
use tracing::{debug, instrument};

const HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co";
const MAX_NEW_TOKENS: u32 = 1024;
const PROVIDER: &str = "huggingface";

/// HuggingFace Inference API adapter.
#[derive(Debug, Clone)]
pub struct HuggingFaceAdapter {
    client: Client,
    base_url: String,
}

impl HuggingFaceAdapter {
    /// Creates an adapter against the public Inference API.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, HUGGINGFACE_API_URL)
    }

    /// Creates an adapter against a custom root, such as a dedicated endpoint.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Render the conversation as a single prompt ending on the assistant's cue.
    fn render_prompt(messages: &[Message]) -> String {
        let (system, turns) = split_system(messages);
        let mut prompt = String::new();
        if let Some(system) = system {
            prompt.push_str(system);
            prompt.push_str("\n\n");
        }
        for message in turns {
            let speaker = match message.role {
                Role::Assistant => "Assistant",
                _ => "User",
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(&message.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }

    fn build_request(messages: &[Message]) -> TextGenerationRequest {
        TextGenerationRequest {
            inputs: Self::render_prompt(messages),
            parameters: GenerationParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                return_full_text: false,
            },
        }
    }

    fn convert_response(response: TextGenerationResponse) -> UpstreamResult<ChatResponse> {
        match response {
            TextGenerationResponse::Many(generated) => generated
                .into_iter()
                .next()
                .map(|g| ChatResponse::new(g.generated_text().trim_start()))
                .ok_or_else(|| protocol_error(PROVIDER, "response has no generated text")),
            TextGenerationResponse::One(generated) => {
                Ok(ChatResponse::new(generated.generated_text().trim_start()))
            }
            TextGenerationResponse::Error { error } => {
                Err(UpstreamError::new(UpstreamErrorKind::Unavailable(error)).with_provider(PROVIDER))
            }
        }
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn backend(&self) -> Backend {
        Backend::HuggingFace
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        debug!("Sending text generation request");
        let url = format!("{}/models/{}", self.base_url.trim_end_matches('/'), model_id);
        let request = self
            .client
            .post(url)
            .bearer_auth(credential.expose())
            .json(&Self::build_request(messages));

        let response = http::send(request, PROVIDER).await?;
        let parsed: TextGenerationResponse = http::read_json(response, PROVIDER).await?;
        Self::convert_response(parsed)
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        let response = self.complete(messages, model_id, credential).await?;
        debug!(len = response.content.len(), "Emulating stream from buffered answer");
        Ok(emulated_stream(response.content))
    }
}
