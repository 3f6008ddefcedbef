//! Just-in-time API key acquisition for key-based backends.

use std::env;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::CommitError;
use crate::llm::ProviderKind;
use crate::secrets::{CredentialPrompt, SecretStore};

/// Lookup used for the environment-variable fallback.
pub type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Resolves a provider's API key on demand.
///
/// Order: secret store, then the provider's environment variable (never
/// persisted), then a masked prompt whose answer is persisted. Keys are not
/// cached; every call goes back to the store.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
    prompt: Arc<dyn CredentialPrompt>,
    env: EnvLookup,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>, prompt: Arc<dyn CredentialPrompt>) -> Self {
        Self {
            store,
            prompt,
            env: process_env,
        }
    }

    /// Replace the environment lookup.
    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub async fn resolve(&self, provider: ProviderKind) -> Result<String, CommitError> {
        let key = provider.secret_key();

        if let Some(secret) = self.store.get(&key).await?
            && !secret.trim().is_empty()
        {
            return Ok(secret);
        }

        if let Some(var) = provider.api_key_env_var()
            && let Some(secret) = (self.env)(var).filter(|s| !s.trim().is_empty())
        {
            debug!("Using {} API key from {}", provider, var);
            return Ok(secret.trim().to_string());
        }

        match self.prompt.request_secret(provider).await? {
            Some(secret) if !secret.trim().is_empty() => {
                let secret = secret.trim().to_string();
                self.store.store(&key, &secret).await?;
                info!("Stored {} API key", provider);
                Ok(secret)
            }
            _ => Err(CommitError::MissingCredential { provider }),
        }
    }
}
