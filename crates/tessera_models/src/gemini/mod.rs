//! Google Gemini REST adapter.

mod client;
mod dto;

pub use client::GeminiAdapter;
