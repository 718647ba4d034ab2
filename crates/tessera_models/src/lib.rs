//! Upstream provider adapters for Tessera.
//!
//! One [`ProviderAdapter`](tessera_interface::ProviderAdapter) implementation per
//! supported backend. Each adapter builds the backend-specific request (including
//! where the system instruction goes) and decodes the backend's native framing into
//! the uniform chunk stream.
//!
//! # Available Providers
//!
//! - **Anthropic** - Messages API, typed SSE events
//! - **OpenAI** - Chat Completions, `data:` SSE terminated by `[DONE]`
//! - **Gemini** - `generateContent`, SSE via `alt=sse`
//! - **Groq** - OpenAI-compatible
//! - **HuggingFace** - text generation, buffered then chunked
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tessera_core::{Message, Secret};
//! use tessera_interface::ProviderAdapter;
//! use tessera_models::{GroqAdapter, build_http_client};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = build_http_client(Duration::from_secs(10), Duration::from_secs(60))?;
//! let adapter = GroqAdapter::new(client);
//! let key = Secret::new(std::env::var("GROQ_API_KEY")?);
//! let response = adapter
//!     .complete(&[Message::user("Hello")], "llama-3.1-8b-instant", &key)
//!     .await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

mod anthropic;
mod emulation;
mod gemini;
mod groq;
mod http;
mod huggingface;
mod openai;
mod openai_compat;
mod sse;
mod turns;

pub use anthropic::AnthropicAdapter;
pub use emulation::{emulated_stream, split_for_emulation};
pub use gemini::GeminiAdapter;
pub use groq::GroqAdapter;
pub use http::{build_http_client, classify_status};
pub use huggingface::HuggingFaceAdapter;
pub use openai::OpenAiAdapter;
pub use openai_compat::OpenAICompatibleClient;
pub use sse::{SseDecoder, SseEvent, SseStep, StreamEnd, decode_sse};
