//! Anthropic Messages API adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{max_tokens, require_text, system_prompt, temperature};
use crate::error::CommitError;
use crate::llm::credentials::CredentialResolver;
use crate::llm::http;
use crate::llm::normalize::{CommitMessage, validate_response};
use crate::llm::prompt::build_request_prompt;
use crate::llm::provider::{CommitProvider, ProviderDescriptor, ProviderKind};
use crate::llm::request::GenerationRequest;

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

pub struct AnthropicProvider {
    descriptor: ProviderDescriptor,
    credentials: CredentialResolver,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(descriptor: ProviderDescriptor, credentials: CredentialResolver, client: Client) -> Self {
        Self {
            descriptor,
            credentials,
            client,
        }
    }
}

#[async_trait]
impl CommitProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, CommitError> {
        let api_key = self.credentials.resolve(ProviderKind::Anthropic).await?;
        let prompt = build_request_prompt(&request);

        let body = MessagesRequest {
            model: &self.descriptor.model,
            max_tokens: max_tokens(&request),
            temperature: temperature(&request),
            system: system_prompt(&request),
            messages: [UserMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response: MessagesResponse = http::post_json(
            &self.client,
            &self.descriptor,
            &self.descriptor.url("messages"),
            &body,
            Some(&api_key),
            &[("anthropic-version", ANTHROPIC_VERSION)],
        )
        .await?;

        let text = response.content.into_iter().next().and_then(|b| b.text);
        let text = require_text(ProviderKind::Anthropic, text)?;
        validate_response(&text, request.style)
    }

    async fn is_configured(&self) -> Result<bool, CommitError> {
        self.credentials
            .resolve(ProviderKind::Anthropic)
            .await
            .map(|_| true)
    }
}
