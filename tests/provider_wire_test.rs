//! Wire-format tests for every backend adapter against a mock HTTP server.

mod common;

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{MemorySecretStore, ScriptedPrompt, no_env, settings_for, unused_local_url};
use unicommit::config::DEFAULT_SYSTEM_PROMPT;
use unicommit::error::CommitError;
use unicommit::llm::{
    CommitProvider, GenerationRequest, MessageStyle, ProviderFactory, ProviderKind, ProviderSource,
};

const KEY: &str = "sk-test-123";

fn provider(kind: ProviderKind, base_url: &str) -> Box<dyn CommitProvider> {
    let factory = ProviderFactory::new(
        Arc::new(MemorySecretStore::with_key(kind, KEY)),
        Arc::new(ScriptedPrompt::declining()),
    )
    .with_env_lookup(no_env);
    factory.create(&settings_for(kind, base_url)).unwrap()
}

fn request() -> GenerationRequest {
    GenerationRequest::new("Staged changes:\nMODIFIED src/parser.rs\n\nDiff:\n+fn parse() {}")
}

fn chat_reply(content: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

async fn only_request_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn test_openai_uses_bearer_and_completion_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(body_partial_json(json!({
            "model": "openai-test",
            "max_completion_tokens": 200,
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Add parser entry point")))
        .expect(1)
        .mount(&server)
        .await;

    let message = provider(ProviderKind::OpenAi, &server.uri())
        .generate(request())
        .await
        .unwrap();
    assert_eq!(message.as_str(), "Add parser entry point");

    let body = only_request_body(&server).await;
    assert!(body.get("max_tokens").is_none());
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("MODIFIED src/parser.rs"));
}

#[tokio::test]
async fn test_compatible_backends_send_max_tokens() {
    for kind in [ProviderKind::Mistral, ProviderKind::DeepSeek, ProviderKind::Qwen] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", format!("Bearer {KEY}").as_str()))
            .and(body_partial_json(json!({ "max_tokens": 200 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Fix typo")))
            .expect(1)
            .mount(&server)
            .await;

        let message = provider(kind, &server.uri()).generate(request()).await.unwrap();
        assert_eq!(message.as_str(), "Fix typo", "{kind}");

        let body = only_request_body(&server).await;
        assert!(body.get("max_completion_tokens").is_none(), "{kind}");
    }
}

#[tokio::test]
async fn test_openrouter_sends_title_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-title", "unicommit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Bump deps")))
        .expect(1)
        .mount(&server)
        .await;

    let message = provider(ProviderKind::OpenRouter, &server.uri())
        .generate(request())
        .await
        .unwrap();
    assert_eq!(message.as_str(), "Bump deps");
}

#[tokio::test]
async fn test_anthropic_messages_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", KEY))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "anthropic-test",
            "max_tokens": 200,
            "system": DEFAULT_SYSTEM_PROMPT
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "Refactor parser" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = provider(ProviderKind::Anthropic, &server.uri())
        .generate(request())
        .await
        .unwrap();
    assert_eq!(message.as_str(), "Refactor parser");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_gemini_generate_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 200 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Document parser" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = provider(ProviderKind::Gemini, &server.uri())
        .generate(request())
        .await
        .unwrap();
    assert_eq!(message.as_str(), "Document parser");

    let body = only_request_body(&server).await;
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with(DEFAULT_SYSTEM_PROMPT));
    assert!(text.contains("MODIFIED src/parser.rs"));
}

#[tokio::test]
async fn test_ollama_generate_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "0.5.0" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "ollama-test",
            "stream": false,
            "options": { "num_predict": 200 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Add local model support",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ollama = provider(ProviderKind::Ollama, &server.uri());
    assert!(ollama.is_configured().await.unwrap());
    let message = ollama.generate(request()).await.unwrap();
    assert_eq!(message.as_str(), "Add local model support");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
}

#[tokio::test]
async fn test_lm_studio_uses_v1_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Tune sampler")))
        .expect(1)
        .mount(&server)
        .await;

    let lm_studio = provider(ProviderKind::LmStudio, &server.uri());
    assert!(lm_studio.is_configured().await.unwrap());
    let message = lm_studio.generate(request()).await.unwrap();
    assert_eq!(message.as_str(), "Tune sampler");
}

#[tokio::test]
async fn test_unreachable_local_server() {
    let url = unused_local_url();
    let ollama = provider(ProviderKind::Ollama, &url);

    assert!(!ollama.is_configured().await.unwrap());
    match ollama.generate(request()).await.unwrap_err() {
        CommitError::LocalServerUnreachable { backend, url: reported } => {
            assert_eq!(backend, ProviderKind::Ollama);
            assert_eq!(reported, url);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_carries_upstream_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = provider(ProviderKind::OpenAi, &server.uri())
        .generate(request())
        .await
        .unwrap_err();
    match err {
        CommitError::Provider {
            backend,
            status,
            message,
        } => {
            assert_eq!(backend, ProviderKind::OpenAi);
            assert_eq!(status, Some(401));
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = provider(ProviderKind::DeepSeek, &server.uri())
        .generate(request())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "DeepSeek API error: No response from DeepSeek");
}

#[tokio::test]
async fn test_detailed_style_raises_token_budget_and_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "max_tokens": 300 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "\"feat(parser): add entry point\n\n- expose parse()\"" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = request();
    request.style = MessageStyle::Detailed;
    let message = provider(ProviderKind::Anthropic, &server.uri())
        .generate(request)
        .await
        .unwrap();
    assert_eq!(message.as_str(), "feat(parser): add entry point\n\n- expose parse()");
}

#[tokio::test]
async fn test_missing_key_is_prompted_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-typed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Add docs")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySecretStore::default());
    let prompt = Arc::new(ScriptedPrompt::answering("  sk-typed  "));
    let factory = ProviderFactory::new(store.clone(), prompt.clone()).with_env_lookup(no_env);
    let provider = factory
        .create(&settings_for(ProviderKind::Mistral, &server.uri()))
        .unwrap();

    let message = provider.generate(request()).await.unwrap();
    assert_eq!(message.as_str(), "Add docs");
    assert_eq!(prompt.calls(), 1);
    assert_eq!(store.key_for(ProviderKind::Mistral).as_deref(), Some("sk-typed"));
}
