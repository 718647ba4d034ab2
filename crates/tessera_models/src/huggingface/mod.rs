//! HuggingFace Inference API adapter.
//!
//! Text generation has no native token stream here, so streaming requests are
//! served by buffering the full answer and re-emitting it in chunks.

mod client;
mod dto;

pub use client::HuggingFaceAdapter;
