//! OpenAI-compatible chat completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{max_tokens, require_text, system_prompt, temperature};
use crate::error::CommitError;
use crate::llm::credentials::CredentialResolver;
use crate::llm::http;
use crate::llm::normalize::{CommitMessage, validate_response};
use crate::llm::prompt::build_request_prompt;
use crate::llm::provider::{CommitProvider, ProviderDescriptor, ProviderKind};
use crate::llm::request::GenerationRequest;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Adapter for every backend speaking the `chat/completions` dialect.
///
/// Key-based variants carry a [`CredentialResolver`]; LM Studio has none and
/// is probed for reachability instead.
pub struct ChatCompletionsProvider {
    descriptor: ProviderDescriptor,
    credentials: Option<CredentialResolver>,
    client: Client,
}

impl ChatCompletionsProvider {
    /// Hosted, key-based backend.
    pub fn hosted(
        descriptor: ProviderDescriptor,
        credentials: CredentialResolver,
        client: Client,
    ) -> Self {
        Self {
            descriptor,
            credentials: Some(credentials),
            client,
        }
    }

    /// LM Studio's local server.
    pub fn lm_studio(descriptor: ProviderDescriptor, client: Client) -> Self {
        Self {
            descriptor,
            credentials: None,
            client,
        }
    }

    fn completions_url(&self) -> String {
        match self.descriptor.kind {
            ProviderKind::LmStudio => self.descriptor.url("v1/chat/completions"),
            _ => self.descriptor.url("chat/completions"),
        }
    }

    fn extra_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self.descriptor.kind {
            ProviderKind::OpenRouter => &[("X-Title", "unicommit")],
            _ => &[],
        }
    }

    async fn api_key(&self) -> Result<Option<String>, CommitError> {
        match &self.credentials {
            Some(resolver) => resolver.resolve(self.descriptor.kind).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CommitProvider for ChatCompletionsProvider {
    fn kind(&self) -> ProviderKind {
        self.descriptor.kind
    }

    async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, CommitError> {
        let api_key = self.api_key().await?;
        let prompt = build_request_prompt(&request);
        let tokens = max_tokens(&request);

        // OpenAI's current models only accept the newer token field.
        let (max_tokens, max_completion_tokens) = match self.descriptor.kind {
            ProviderKind::OpenAi => (None, Some(tokens)),
            _ => (Some(tokens), None),
        };

        let body = ChatRequest {
            model: &self.descriptor.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt(&request),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens,
            max_completion_tokens,
            temperature: temperature(&request),
        };

        let response: ChatResponse = http::post_json(
            &self.client,
            &self.descriptor,
            &self.completions_url(),
            &body,
            api_key.as_deref(),
            self.extra_headers(),
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        let text = require_text(self.descriptor.kind, content)?;

        info!("{} returned {} chars", self.descriptor.kind, text.len());
        validate_response(&text, request.style)
    }

    async fn is_configured(&self) -> Result<bool, CommitError> {
        match self.descriptor.kind {
            ProviderKind::LmStudio => {
                Ok(http::probe(&self.client, &self.descriptor.url("v1/models")).await)
            }
            _ => self.api_key().await.map(|key| key.is_some()),
        }
    }
}
