//! Shared client for OpenAI-compatible Chat Completions APIs.
//!
//! OpenAI and Groq speak the same wire format: bearer authentication, a
//! `messages` array where the system instruction is just another role, and
//! `data:` SSE lines terminated by `data: [DONE]`.

use crate::http::{self, protocol_error};
use crate::sse::{SseEvent, SseStep, StreamEnd, decode_sse};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tessera_core::{ChatResponse, Message, Role, Secret};
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::ChunkStream;
use tracing::{debug, instrument};

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Client for any OpenAI-compatible Chat Completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    base_url: String,
    provider: &'static str,
}

impl OpenAICompatibleClient {
    /// Creates a client rooted at `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(client: Client, base_url: impl Into<String>, provider: &'static str) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            provider,
        }
    }

    /// Provider name used for error attribution.
    pub fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(
        messages: &'a [Message],
        model_id: &'a str,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        let messages = messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect();
        ChatCompletionRequest {
            model: model_id,
            messages,
            stream,
        }
    }

    /// Sends a non-streaming completion request.
    ///
    /// # Errors
    ///
    /// Returns a classified [`UpstreamError`] on transport, status or decoding failure.
    #[instrument(skip(self, messages, credential), fields(provider = self.provider, model = %model_id))]
    pub async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        debug!(count = messages.len(), "Sending chat completion");
        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .json(&Self::request_body(messages, model_id, false));

        let response = http::send(request, self.provider).await?;
        let body: ChatCompletionResponse = http::read_json(response, self.provider).await?;
        Self::convert_response(body, self.provider)
    }

    fn convert_response(
        body: ChatCompletionResponse,
        provider: &'static str,
    ) -> UpstreamResult<ChatResponse> {
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| protocol_error(provider, "response has no choices"))?;
        let mut response = ChatResponse::new(choice.message.content.unwrap_or_default());
        if let Some(usage) = body.usage {
            response = response.with_tokens_used(usage.total_tokens);
        }
        Ok(response)
    }

    /// Sends a streaming completion request.
    ///
    /// # Errors
    ///
    /// Returns a classified [`UpstreamError`] if the request is rejected before
    /// the body starts. Later failures arrive through the stream.
    #[instrument(skip(self, messages, credential), fields(provider = self.provider, model = %model_id))]
    pub async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        debug!(count = messages.len(), "Opening chat completion stream");
        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .json(&Self::request_body(messages, model_id, true));

        let response = http::send(request, self.provider).await?;
        let provider = self.provider;
        let bytes = response
            .bytes_stream()
            .map(move |read| read.map_err(|e| http::classify_transport(&e, provider)));
        Ok(decode_sse(
            bytes,
            StreamEnd::Marker { provider },
            move |event| Self::stream_step(event, provider),
        ))
    }

    fn stream_step(event: SseEvent, provider: &'static str) -> UpstreamResult<SseStep> {
        if event.data.trim() == "[DONE]" {
            return Ok(SseStep::Done);
        }
        let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)
            .map_err(|e| protocol_error(provider, format!("Invalid stream chunk: {}", e)))?;

        if let Some(error) = chunk.error {
            let kind = match error.kind.as_deref() {
                Some(kind) if kind.contains("rate_limit") => {
                    UpstreamErrorKind::RateLimited(error.message)
                }
                Some("invalid_request_error") => UpstreamErrorKind::Protocol(error.message),
                _ => UpstreamErrorKind::Unavailable(error.message),
            };
            return Err(UpstreamError::new(kind).with_provider(provider));
        }

        let text: String = chunk
            .choices
            .into_iter()
            .filter_map(|choice| choice.delta.content)
            .collect();
        Ok(if text.is_empty() {
            SseStep::Skip
        } else {
            SseStep::Text(text)
        })
    }
}
