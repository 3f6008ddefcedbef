//! Backend adapters, grouped by wire format.
//!
//! - `chat_completions` - OpenAI-compatible `messages` APIs (OpenAI, Mistral,
//!   DeepSeek, OpenRouter, Qwen, LM Studio)
//! - `anthropic` - Anthropic Messages API
//! - `gemini` - Google `generateContent`
//! - `ollama` - Ollama `/api/generate`
//!
//! Every adapter funnels its request through the prompt builder and its raw
//! text through the response normalizer; only the envelope differs.

pub mod anthropic;
pub mod chat_completions;
pub mod gemini;
pub mod ollama;

pub use anthropic::AnthropicProvider;
pub use chat_completions::ChatCompletionsProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DETAILED_MAX_TOKENS};
use crate::error::CommitError;
use crate::llm::ProviderKind;
use crate::llm::request::{GenerationRequest, MessageStyle};

/// Token budget: explicit request value, else 300 for detailed, else 200.
pub(crate) fn max_tokens(request: &GenerationRequest) -> u32 {
    request.max_tokens.unwrap_or(match request.style {
        MessageStyle::Detailed => DETAILED_MAX_TOKENS,
        _ => DEFAULT_MAX_TOKENS,
    })
}

pub(crate) fn temperature(request: &GenerationRequest) -> f32 {
    request.temperature.unwrap_or(DEFAULT_TEMPERATURE)
}

pub(crate) fn system_prompt(request: &GenerationRequest) -> &str {
    request
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
}

/// Single-string prompt for backends without a chat schema.
pub(crate) fn single_prompt(system: &str, user: &str) -> String {
    format!(
        "{system}\n\nUser request: {user}\n\nPlease respond with ONLY the commit message, no explanations or additional text."
    )
}

/// Text found at the backend's extraction path, or its "no response" error.
pub(crate) fn require_text(
    backend: ProviderKind,
    text: Option<String>,
) -> Result<String, CommitError> {
    text.filter(|t| !t.is_empty())
        .ok_or_else(|| CommitError::Provider {
            backend,
            status: None,
            message: format!("No response from {backend}"),
        })
}
