//! Provider selection from configuration.

use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use crate::config::Settings;
use crate::error::CommitError;
use crate::llm::backends::{
    AnthropicProvider, ChatCompletionsProvider, GeminiProvider, OllamaProvider,
};
use crate::llm::credentials::{CredentialResolver, EnvLookup};
use crate::llm::provider::{CommitProvider, ProviderDescriptor, ProviderKind};
use crate::secrets::{CredentialPrompt, SecretStore};

/// Supplies the adapter for one generation call.
#[cfg_attr(test, mockall::automock)]
pub trait ProviderSource: Send + Sync {
    fn create(&self, settings: &Settings) -> Result<Box<dyn CommitProvider>, CommitError>;
}

/// Builds the configured adapter for one generation call.
///
/// Holds only the shared collaborators; descriptors are rebuilt from the
/// settings passed to every [`ProviderSource::create`] call.
#[derive(Clone)]
pub struct ProviderFactory {
    store: Arc<dyn SecretStore>,
    prompt: Arc<dyn CredentialPrompt>,
    env: Option<EnvLookup>,
    client: Client,
}

impl ProviderFactory {
    pub fn new(store: Arc<dyn SecretStore>, prompt: Arc<dyn CredentialPrompt>) -> Self {
        Self {
            store,
            prompt,
            env: None,
            client: Client::new(),
        }
    }

    /// Replace the environment lookup handed to credential resolvers.
    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = Some(env);
        self
    }

    fn resolver(&self) -> CredentialResolver {
        let resolver = CredentialResolver::new(self.store.clone(), self.prompt.clone());
        match self.env {
            Some(env) => resolver.with_env_lookup(env),
            None => resolver,
        }
    }

    /// Resolve the descriptor for `kind` from settings.
    pub fn descriptor(settings: &Settings, kind: ProviderKind) -> ProviderDescriptor {
        ProviderDescriptor::new(kind, settings.base_url(kind), settings.model(kind))
    }
}

impl ProviderSource for ProviderFactory {
    fn create(&self, settings: &Settings) -> Result<Box<dyn CommitProvider>, CommitError> {
        let id = settings.provider_id();
        let kind = ProviderKind::from_id(id)
            .ok_or_else(|| CommitError::UnsupportedProvider(id.to_string()))?;
        let descriptor = Self::descriptor(settings, kind);
        let client = self.client.clone();

        debug!(
            "Creating {} provider (model {}, {})",
            kind, descriptor.model, descriptor.base_url
        );

        let provider: Box<dyn CommitProvider> = match kind {
            ProviderKind::OpenAi
            | ProviderKind::Mistral
            | ProviderKind::DeepSeek
            | ProviderKind::OpenRouter
            | ProviderKind::Qwen => Box::new(ChatCompletionsProvider::hosted(
                descriptor,
                self.resolver(),
                client,
            )),
            ProviderKind::LmStudio => Box::new(ChatCompletionsProvider::lm_studio(descriptor, client)),
            ProviderKind::Anthropic => {
                Box::new(AnthropicProvider::new(descriptor, self.resolver(), client))
            }
            ProviderKind::Gemini => Box::new(GeminiProvider::new(descriptor, self.resolver(), client)),
            ProviderKind::Ollama => Box::new(OllamaProvider::new(descriptor, client)),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::prompt::MockCredentialPrompt;
    use crate::secrets::store::MockSecretStore;

    fn factory() -> ProviderFactory {
        ProviderFactory::new(
            Arc::new(MockSecretStore::new()),
            Arc::new(MockCredentialPrompt::new()),
        )
        .with_env_lookup(|_| None)
    }

    fn settings_for(provider: &str) -> Settings {
        Settings {
            provider: Some(provider.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_every_supported_provider() {
        let factory = factory();
        for kind in ProviderKind::ALL {
            let provider = factory.create(&settings_for(kind.id())).unwrap();
            assert_eq!(provider.kind(), kind);
        }
    }

    #[test]
    fn test_provider_id_is_case_insensitive() {
        let provider = factory().create(&settings_for("  LMStudio ")).unwrap();
        assert_eq!(provider.kind(), ProviderKind::LmStudio);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = factory().create(&settings_for("cohere")).err().unwrap();
        assert!(matches!(err, CommitError::UnsupportedProvider(ref id) if id == "cohere"));
        assert_eq!(err.to_string(), "Unsupported provider type: cohere");
    }

    #[test]
    fn test_descriptor_reflects_settings() {
        let mut settings = settings_for("ollama");
        settings.providers.insert(
            "ollama".to_string(),
            crate::config::ProviderSettings {
                model: Some("qwen2.5-coder".to_string()),
                base_url: Some("http://gpu-box:11434/".to_string()),
            },
        );

        let descriptor = ProviderFactory::descriptor(&settings, ProviderKind::Ollama);
        assert_eq!(descriptor.model, "qwen2.5-coder");
        assert_eq!(descriptor.base_url, "http://gpu-box:11434");
        assert_eq!(descriptor.auth, crate::llm::provider::AuthScheme::None);
    }
}
