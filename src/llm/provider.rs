//! Provider identifiers, descriptors, and the uniform adapter contract.

use std::fmt;

use async_trait::async_trait;

use crate::error::CommitError;
use crate::llm::normalize::CommitMessage;
use crate::llm::request::GenerationRequest;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Mistral,
    DeepSeek,
    OpenRouter,
    Qwen,
    Ollama,
    LmStudio,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 9] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Mistral,
        ProviderKind::DeepSeek,
        ProviderKind::OpenRouter,
        ProviderKind::Qwen,
        ProviderKind::Ollama,
        ProviderKind::LmStudio,
    ];

    /// Human-readable backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Mistral => "Mistral",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::Qwen => "Qwen",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::LmStudio => "LM Studio",
        }
    }

    /// Identifier used in configuration files and secret keys.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mistral => "mistral",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Qwen => "qwen",
            ProviderKind::Ollama => "ollama",
            ProviderKind::LmStudio => "lmstudio",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        ProviderKind::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Local inference servers need no credential and are probed for reachability.
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Ollama | ProviderKind::LmStudio)
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            ProviderKind::Anthropic => AuthScheme::HeaderApiKey("x-api-key"),
            ProviderKind::Gemini => AuthScheme::HeaderApiKey("x-goog-api-key"),
            ProviderKind::Ollama | ProviderKind::LmStudio => AuthScheme::None,
            _ => AuthScheme::Bearer,
        }
    }

    /// Key under which the API key is kept in the secret store.
    pub fn secret_key(&self) -> String {
        format!("unicommit.{}.apiKey", self.id())
    }

    /// Environment variable consulted before prompting for a key.
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Mistral => Some("MISTRAL_API_KEY"),
            ProviderKind::DeepSeek => Some("DEEPSEEK_API_KEY"),
            ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderKind::Qwen => Some("DASHSCOPE_API_KEY"),
            ProviderKind::Ollama | ProviderKind::LmStudio => None,
        }
    }

    /// Placeholder shown in the masked key prompt.
    pub fn key_hint(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "sk-ant-...",
            ProviderKind::Gemini => "AIza...",
            ProviderKind::OpenRouter => "sk-or-...",
            _ => "sk-...",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-5.1",
            ProviderKind::Anthropic => "claude-haiku-4-5-20251001",
            ProviderKind::Gemini => "gemini-3-pro",
            ProviderKind::Mistral => "mistral-small-latest",
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::OpenRouter => "openai/gpt-5.1",
            ProviderKind::Qwen => "qwen-plus",
            ProviderKind::Ollama => "llama3.2",
            ProviderKind::LmStudio => "llama-3.1-8b-instruct",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Mistral => "https://api.mistral.ai/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Qwen => "https://dashscope-intl.aliyuncs.com/compatible-mode/v1",
            ProviderKind::Ollama => "http://localhost:11434",
            ProviderKind::LmStudio => "http://localhost:1234",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a backend expects to be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Raw key in the named header.
    HeaderApiKey(&'static str),
    /// `Authorization: Bearer <key>`.
    Bearer,
    None,
}

/// Resolved endpoint and model for one generation call.
///
/// Rebuilt from configuration on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub auth: AuthScheme,
}

impl ProviderDescriptor {
    pub fn new(kind: ProviderKind, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            auth: kind.auth_scheme(),
        }
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Uniform contract every backend adapter implements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Generate a normalized commit message for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, CommitError>;

    /// Readiness probe.
    ///
    /// Key-based backends resolve their credential (prompting if needed) and
    /// fail with `MissingCredential` when none is supplied. Local servers
    /// answer `Ok(false)` on any probe failure instead of erroring.
    async fn is_configured(&self) -> Result<bool, CommitError>;
}
