//! Anthropic Messages API adapter.

mod client;
mod dto;

pub use client::AnthropicAdapter;
