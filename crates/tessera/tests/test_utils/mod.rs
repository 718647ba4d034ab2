//! Scripted adapter for metered-flow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tessera::{
    Backend, ChatResponse, ChunkStream, Credentials, Message, ProviderAdapter, Secret,
    StreamChunk, UpstreamError, UpstreamErrorKind, UpstreamResult,
};

/// What every call to a [`ScriptedAdapter`] produces.
#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with these chunks (joined for complete())
    Chunks(Vec<String>),
    /// Emit these chunks, then fail
    ChunksThenError(Vec<String>, UpstreamErrorKind),
    /// Fail before any output
    Error(UpstreamErrorKind),
}

/// Adapter that replays one script and counts calls.
pub struct ScriptedAdapter {
    backend: Backend,
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(backend: Backend, script: Script) -> Arc<Self> {
        Arc::new(Self {
            backend,
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn answering(backend: Backend, chunks: &[&str]) -> Arc<Self> {
        Self::new(
            backend,
            Script::Chunks(chunks.iter().map(|c| c.to_string()).collect()),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self, kind: UpstreamErrorKind) -> UpstreamError {
        UpstreamError::new(kind).with_provider(self.backend.name())
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _model_id: &str,
        _credential: &Secret,
    ) -> UpstreamResult<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Chunks(chunks) => Ok(ChatResponse::new(chunks.concat())),
            Script::ChunksThenError(_, kind) | Script::Error(kind) => Err(self.fail(kind.clone())),
        }
    }

    async fn stream_complete(
        &self,
        _messages: &[Message],
        _model_id: &str,
        _credential: &Secret,
    ) -> UpstreamResult<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let items: Vec<UpstreamResult<StreamChunk>> = match &self.script {
            Script::Chunks(chunks) => chunks.iter().map(|c| Ok(StreamChunk::new(c))).collect(),
            Script::ChunksThenError(chunks, kind) => chunks
                .iter()
                .map(|c| Ok(StreamChunk::new(c)))
                .chain(std::iter::once(Err(self.fail(kind.clone()))))
                .collect(),
            Script::Error(kind) => return Err(self.fail(kind.clone())),
        };
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

/// Credentials for every default binding.
pub fn all_credentials() -> Credentials {
    Credentials::from_pairs([
        ("ANTHROPIC_API_KEY", "sk-ant-test"),
        ("ANTHROPIC_PRO_API_KEY", "sk-ant-pro-test"),
        ("GEMINI_API_KEY", "gemini-test"),
        ("GROQ_API_KEY", "gsk-test"),
        ("OPENAI_API_KEY", "sk-test"),
    ])
}
