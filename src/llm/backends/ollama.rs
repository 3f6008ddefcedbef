//! Ollama local server adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{max_tokens, require_text, single_prompt, system_prompt, temperature};
use crate::error::CommitError;
use crate::llm::http;
use crate::llm::normalize::{CommitMessage, validate_response};
use crate::llm::prompt::build_request_prompt;
use crate::llm::provider::{CommitProvider, ProviderDescriptor, ProviderKind};
use crate::llm::request::GenerationRequest;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

pub struct OllamaProvider {
    descriptor: ProviderDescriptor,
    client: Client,
}

impl OllamaProvider {
    pub fn new(descriptor: ProviderDescriptor, client: Client) -> Self {
        Self { descriptor, client }
    }
}

#[async_trait]
impl CommitProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, request: GenerationRequest) -> Result<CommitMessage, CommitError> {
        let body = GenerateRequest {
            model: &self.descriptor.model,
            prompt: single_prompt(system_prompt(&request), &build_request_prompt(&request)),
            stream: false,
            options: GenerateOptions {
                temperature: temperature(&request),
                num_predict: max_tokens(&request),
            },
        };

        let response: GenerateResponse = http::post_json(
            &self.client,
            &self.descriptor,
            &self.descriptor.url("api/generate"),
            &body,
            None,
            &[],
        )
        .await?;

        let text = require_text(ProviderKind::Ollama, response.response)?;
        validate_response(&text, request.style)
    }

    async fn is_configured(&self) -> Result<bool, CommitError> {
        Ok(http::probe(&self.client, &self.descriptor.url("api/version")).await)
    }
}
