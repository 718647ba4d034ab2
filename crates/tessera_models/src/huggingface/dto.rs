//! HuggingFace Inference API data transfer objects.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Text-generation request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TextGenerationRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct GenerationParameters {
    pub max_new_tokens: u32,
    pub return_full_text: bool,
}

/// One generated sequence.
#[derive(Debug, Clone, Deserialize, Getters)]
pub(crate) struct GeneratedText {
    generated_text: String,
}

/// The endpoint answers with a list, a single object, or an error object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TextGenerationResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
    Error { error: String },
}
