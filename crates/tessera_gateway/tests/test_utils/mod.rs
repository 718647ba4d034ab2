//! Mock provider adapter for gateway tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tessera_core::{Backend, ChatResponse, Message, Secret, StreamChunk};
use tessera_error::{UpstreamError, UpstreamErrorKind, UpstreamResult};
use tessera_interface::{ChunkStream, ProviderAdapter};

/// A single mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Succeed with this text
    Success(String),
    /// Fail before any output
    Error(UpstreamErrorKind),
    /// Stream these chunks, then fail (complete() fails immediately)
    ChunksThenError(Vec<String>, UpstreamErrorKind),
    /// Stream these chunks, then go silent without closing (complete() hangs)
    ChunksThenStall(Vec<String>),
    /// Never answer
    Hang,
}

/// Behavior configuration for mock responses.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always return this response
    Always(MockResponse),
    /// Fail N times with the error, then succeed with the text
    FailThenSucceed {
        fail_count: usize,
        error: UpstreamErrorKind,
        success_text: String,
    },
    /// Return a sequence of responses; calls past the end fail with a protocol error
    Sequence(Vec<MockResponse>),
}

/// Mock adapter that records how often it was called.
pub struct MockAdapter {
    backend: Backend,
    behavior: MockBehavior,
    call_count: Arc<Mutex<usize>>,
}

impl MockAdapter {
    /// Create a mock with custom behavior.
    pub fn new(backend: Backend, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            backend,
            behavior,
            call_count: Arc::new(Mutex::new(0)),
        })
    }

    /// Always succeed with the given text.
    pub fn success(backend: Backend, text: impl Into<String>) -> Arc<Self> {
        Self::new(backend, MockBehavior::Always(MockResponse::Success(text.into())))
    }

    /// Always fail with the given error.
    pub fn error(backend: Backend, kind: UpstreamErrorKind) -> Arc<Self> {
        Self::new(backend, MockBehavior::Always(MockResponse::Error(kind)))
    }

    /// Number of complete() and stream_complete() calls so far.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn next_response(&self) -> MockResponse {
        let mut count = self.call_count.lock().unwrap();
        let current = *count;
        *count += 1;

        match &self.behavior {
            MockBehavior::Always(response) => response.clone(),
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success_text,
            } => {
                if current < *fail_count {
                    MockResponse::Error(error.clone())
                } else {
                    MockResponse::Success(success_text.clone())
                }
            }
            MockBehavior::Sequence(responses) => {
                responses.get(current).cloned().unwrap_or_else(|| {
                    MockResponse::Error(UpstreamErrorKind::Protocol(format!(
                        "mock sequence exhausted (call {} beyond {} responses)",
                        current + 1,
                        responses.len()
                    )))
                })
            }
        }
    }

    fn fail(&self, kind: UpstreamErrorKind) -> UpstreamError {
        UpstreamError::new(kind).with_provider(self.backend.name())
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _model_id: &str,
        _credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        match self.next_response() {
            MockResponse::Success(text) => Ok(ChatResponse::new(text).with_tokens_used(7)),
            MockResponse::Error(kind) | MockResponse::ChunksThenError(_, kind) => {
                Err(self.fail(kind))
            }
            MockResponse::Hang | MockResponse::ChunksThenStall(_) => {
                std::future::pending().await
            }
        }
    }

    async fn stream_complete(
        &self,
        _messages: &[Message],
        _model_id: &str,
        _credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let items: Vec<UpstreamResult<StreamChunk>> = match self.next_response() {
            MockResponse::Success(text) => tessera_models::split_for_emulation(&text)
                .into_iter()
                .map(|chunk| Ok(StreamChunk::new(chunk)))
                .collect(),
            MockResponse::Error(kind) => return Err(self.fail(kind)),
            MockResponse::ChunksThenError(chunks, kind) => chunks
                .into_iter()
                .map(|chunk| Ok(StreamChunk::new(chunk)))
                .chain(std::iter::once(Err(self.fail(kind))))
                .collect(),
            MockResponse::ChunksThenStall(chunks) => {
                let chunks = chunks.into_iter().map(|chunk| Ok(StreamChunk::new(chunk)));
                return Ok(Box::pin(
                    futures_util::stream::iter(chunks).chain(futures_util::stream::pending()),
                ));
            }
            MockResponse::Hang => std::future::pending().await,
        };
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

/// Credentials for every default binding.
pub fn all_credentials() -> tessera_routing::Credentials {
    tessera_routing::Credentials::from_pairs([
        ("ANTHROPIC_API_KEY", "sk-ant-test"),
        ("ANTHROPIC_PRO_API_KEY", "sk-ant-pro-test"),
        ("GEMINI_API_KEY", "gemini-test"),
        ("GROQ_API_KEY", "gsk-test"),
        ("OPENAI_API_KEY", "sk-test"),
        ("HUGGINGFACE_API_KEY", "hf-test"),
    ])
}

pub fn rate_limited() -> UpstreamErrorKind {
    UpstreamErrorKind::RateLimited("HTTP 429: slow down".into())
}

pub fn unavailable() -> UpstreamErrorKind {
    UpstreamErrorKind::Unavailable("connection reset".into())
}
