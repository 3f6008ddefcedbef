//! Google Gemini `generateContent` adapter.
//!
//! Gemini gets a single concatenated prompt rather than system/user roles.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{max_tokens, require_text, single_prompt, system_prompt, temperature};
use crate::error::CommitError;
use crate::llm::credentials::CredentialResolver;
use crate::llm::http;
use crate::llm::normalize::{CommitMessage, validate_response};
use crate::llm::prompt::build_request_prompt;
use crate::llm::provider::{CommitProvider, ProviderDescriptor, ProviderKind};
use crate::llm::request::GenerationRequest;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiProvider {
    descriptor: ProviderDescriptor,
    credentials: CredentialResolver,
    client: Client,
}

impl GeminiProvider {
    pub fn new(descriptor: ProviderDescriptor, credentials: CredentialResolver, client: Client) -> Self {
        Self {
            descriptor,
            credentials,
            client,
        }
    }

    fn generate_url(&self) -> String {
        self.descriptor
            .url(&format!("models/{}:generateContent", self.descriptor.model))
    }
}

#[async_trait]
impl CommitProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, CommitError> {
        let api_key = self.credentials.resolve(ProviderKind::Gemini).await?;
        let prompt = single_prompt(system_prompt(&request), &build_request_prompt(&request));

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: temperature(&request),
                max_output_tokens: max_tokens(&request),
            },
        };

        let response: GenerateContentResponse = http::post_json(
            &self.client,
            &self.descriptor,
            &self.generate_url(),
            &body,
            Some(&api_key),
            &[],
        )
        .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);
        let text = require_text(ProviderKind::Gemini, text)?;
        validate_response(&text, request.style)
    }

    async fn is_configured(&self) -> Result<bool, CommitError> {
        self.credentials
            .resolve(ProviderKind::Gemini)
            .await
            .map(|_| true)
    }
}
