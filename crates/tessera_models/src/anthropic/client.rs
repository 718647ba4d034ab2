use super::dto::{
    AnthropicMessage, ApiError, BlockDelta, ContentBlock, MessagesRequest, MessagesResponse,
    StreamEvent,
};
use crate::http::{self, protocol_error};
use crate::sse::{SseEvent, SseStep, StreamEnd, decode_sse};
use crate::turns::merged_turns;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use tessera_core::{Backend, ChatResponse, Message, Role, Secret};
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::{ChunkStream, ProviderAdapter};
use tracing::{debug, instrument};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const PROVIDER: &str = "anthropic";

/// Anthropic adapter.
///
/// The system instruction travels in the top-level `system` field, and
/// consecutive same-role turns are merged because the API requires strict
/// alternation.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
}

impl AnthropicAdapter {
    /// Creates an adapter against the public Anthropic API.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, ANTHROPIC_API_URL)
    }

    /// Creates an adapter against a custom root.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        debug!("Creating new Anthropic adapter");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn build_request<'a>(
        messages: &'a [Message],
        model_id: &'a str,
        stream: bool,
    ) -> MessagesRequest<'a> {
        let (system, turns) = merged_turns(messages);
        let messages = turns
            .into_iter()
            .map(|turn| AnthropicMessage {
                role: match turn.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: turn.text,
            })
            .collect();
        MessagesRequest {
            model: model_id,
            max_tokens: MAX_TOKENS,
            system,
            messages,
            stream,
        }
    }

    fn post(&self, credential: &Secret, body: &MessagesRequest<'_>) -> RequestBuilder {
        self.client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", credential.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
    }

    fn convert_response(response: MessagesResponse) -> ChatResponse {
        let content: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        let mut chat = ChatResponse::new(content);
        if let Some(usage) = response.usage {
            chat = chat.with_tokens_used(usage.input_tokens.saturating_add(usage.output_tokens));
        }
        chat
    }

    fn classify_api_error(error: ApiError) -> UpstreamError {
        let kind = match error.kind.as_str() {
            "authentication_error" | "permission_error" => UpstreamErrorKind::Auth(error.message),
            "rate_limit_error" => UpstreamErrorKind::RateLimited(error.message),
            "overloaded_error" | "api_error" | "timeout_error" => {
                UpstreamErrorKind::Unavailable(error.message)
            }
            _ => UpstreamErrorKind::Protocol(format!("{}: {}", error.kind, error.message)),
        };
        UpstreamError::new(kind).with_provider(PROVIDER)
    }

    fn stream_step(event: SseEvent) -> UpstreamResult<SseStep> {
        let parsed: StreamEvent = serde_json::from_str(&event.data)
            .map_err(|e| protocol_error(PROVIDER, format!("Invalid stream event: {}", e)))?;
        match parsed {
            StreamEvent::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } if !text.is_empty() => Ok(SseStep::Text(text)),
            StreamEvent::MessageStop => Ok(SseStep::Done),
            StreamEvent::Error { error } => Err(Self::classify_api_error(error)),
            _ => Ok(SseStep::Skip),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn backend(&self) -> Backend {
        Backend::Anthropic
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        debug!("Sending request to Anthropic API");
        let body = Self::build_request(messages, model_id, false);
        let response = http::send(self.post(credential, &body), PROVIDER).await?;
        let parsed: MessagesResponse = http::read_json(response, PROVIDER).await?;
        Ok(Self::convert_response(parsed))
    }

    #[instrument(skip(self, messages, credential), fields(provider = PROVIDER, model = %model_id))]
    async fn stream_complete(
        &self,
        messages: &[Message],
        model_id: &str,
        credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        debug!("Opening Anthropic message stream");
        let body = Self::build_request(messages, model_id, true);
        let response = http::send(self.post(credential, &body), PROVIDER).await?;
        let bytes = response
            .bytes_stream()
            .map(|read| read.map_err(|e| http::classify_transport(&e, PROVIDER)));
        Ok(decode_sse(
            bytes,
            StreamEnd::Marker { provider: PROVIDER },
            Self::stream_step,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(json: &str) -> SseEvent {
        SseEvent {
            event: None,
            data: json.to_string(),
        }
    }

    #[test]
    fn system_goes_to_top_level_field() {
        let messages = vec![
            Message::system("You are terse."),
            Message::user("Hi"),
            Message::user("Still there?"),
            Message::assistant("Yes."),
        ];
        let request = AnthropicAdapter::build_request(&messages, "claude-opus-4-1", false);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["system"], "You are terse.");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["content"], "Hi\n\nStill there?");
        assert_eq!(json["messages"][1]["role"], "assistant");
    }

    #[test]
    fn no_system_field_without_system_message() {
        let messages = vec![Message::user("Hi")];
        let request = AnthropicAdapter::build_request(&messages, "m", true);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn converts_response_and_usage() {
        let parsed: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","type":"message","role":"assistant","content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"x"},{"type":"text","text":" there"}],"usage":{"input_tokens":10,"output_tokens":4}}"#,
        )
        .unwrap();
        let response = AnthropicAdapter::convert_response(parsed);
        assert_eq!(response.content, "Hello there");
        assert_eq!(response.tokens_used, Some(14));
    }

    #[test]
    fn stream_events_map_to_steps() {
        let step = AnthropicAdapter::stream_step(data(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        ))
        .unwrap();
        assert_eq!(step, SseStep::Text("Hi".into()));

        for skipped in [
            r#"{"type":"message_start","message":{"id":"m"}}"#,
            r#"{"type":"ping"}"#,
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{"}}"#,
        ] {
            assert_eq!(AnthropicAdapter::stream_step(data(skipped)).unwrap(), SseStep::Skip);
        }

        let stop = AnthropicAdapter::stream_step(data(r#"{"type":"message_stop"}"#)).unwrap();
        assert_eq!(stop, SseStep::Done);
    }

    #[test]
    fn overloaded_event_is_unavailable() {
        let err = AnthropicAdapter::stream_step(data(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err.kind, UpstreamErrorKind::Unavailable(_)));
        assert_eq!(err.provider, "anthropic");
    }
}
