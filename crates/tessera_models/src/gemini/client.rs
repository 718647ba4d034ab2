use super::dto::{
    Content, GenerateContentRequest, GenerateContentResponse, Part, SystemInstruction, SystemPart,
};
use crate::http::{self, classify_status, protocol_error};
use crate::sse::{SseEvent, SseStep, StreamEnd, decode_sse};
use crate::turns::merged_turns;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use tessera_core::{Backend, ChatResponse, Message, Role, Secret};
use tessera_error::{UpstreamError, UpstreamResult};
use tessera_interface::{ChunkStream, ProviderAdapter};
use tracing::{debug, instrument, warn};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const PROVIDER: &str = "gemini";

/// Gemini adapter over the public REST API.
///
/// Turns use the roles `user` and `model`; the system instruction goes in
/// `systemInstruction`.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
}

impl GeminiAdapter {
    /// Creates an adapter against the public Gemini API.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GEMINI_API_URL)
    }

    /// Creates an adapter against a custom root.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn build_request(messages: &[Message]) -> GenerateContentRequest<'_> {
        let (system, turns) = merged_turns(messages);
        let contents = turns
            .into_iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: Some(turn.text),
                }],
            })
            .collect();
        GenerateContentRequest {
            contents,
            system_instruction: system.map(|text| SystemInstruction {
                parts: [SystemPart { text }],
            }),
        }
    }

    fn post(&self, url: String, credential: &Secret, messages: &[Message]) -> RequestBuilder {
        self.client
            .post(url)
            .header("x-goog-api-key", credential.expose())
            .json(&Self::build_request(messages))
    }

    fn model_url(&self, model_id: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model_id,
            method
        )
    }

    fn check_error(response: &mut GenerateContentResponse) -> UpstreamResult<()> {
        match response.error.take() {
            Some(error) => Err(UpstreamError::new(classify_status(error.code, &error.message))
                .with_provider(PROVIDER)
                .with_status(error.code)),
            None => Ok(()),
        }
    }

    fn convert_response(mut response: GenerateContentResponse) -> UpstreamResult<ChatResponse> {
        Self::check_error(&mut response)?;
        if response.candidates.is_empty() {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            warn!(reason = %reason, "Gemini returned no candidates");
            return Err(protocol_error(
                PROVIDER,
                format!("response has no candidates: {}", reason),
            ));
        }

        let mut chat = ChatResponse::new(response.text());
        if let Some(total) = response.usage_metadata.and_then(|u| u.total_token_count) {
            chat = chat.with_tokens_used(total);
        }
        Ok(chat)
    }

    fn stream_step(event: SseEvent) -> UpstreamResult<SseStep> {
        let mut parsed: GenerateContentResponse = serde_json::from_str(&event.data)
            .map_err(|e| protocol_error(PROVIDER, format!("Invalid stream event: {}", e)))?;
        Self::check_error(&mut parsed)?;
        let text = parsed.text();
        Ok(if text.is_empty() {
            SseStep::Skip
        } else {
            SseStep::Text(text)
        })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn backend(&self) -> Backend {
        Backend::Gemini
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        debug!("Sending generateContent request");
        let url = self.model_url(model_id, "generateContent");
        let response = http::send(self.post(url, credential, messages), PROVIDER).await?;
        let parsed: GenerateContentResponse = http::read_json(response, PROVIDER).await?;
        Self::convert_response(parsed)
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        debug!("Opening streamGenerateContent stream");
        let url = format!("{}?alt=sse", self.model_url(model_id, "streamGenerateContent"));
        let response = http::send(self.post(url, credential, messages), PROVIDER).await?;
        let bytes = response
            .bytes_stream()
            .map(|read| read.map_err(|e| http::classify_transport(&e, PROVIDER)));
        Ok(decode_sse(bytes, StreamEnd::Close, Self::stream_step))
    }
}
