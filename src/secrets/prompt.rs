//! Interactive, masked API key entry.

use async_trait::async_trait;
use dialoguer::Password;
use indicatif::ProgressBar;
use tracing::warn;

use crate::error::SecretError;
use crate::llm::ProviderKind;

/// Asks the user for a provider's API key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Returns `Ok(None)` when the user declines to enter a key.
    async fn request_secret(&self, provider: ProviderKind) -> Result<Option<String>, SecretError>;
}

/// Masked terminal prompt backed by dialoguer.
///
/// When given the running progress bar, the bar is cleared while the prompt
/// is on screen and redrawn afterwards.
#[derive(Default, Clone)]
pub struct TerminalPrompt {
    bar: Option<ProgressBar>,
}

impl TerminalPrompt {
    pub fn with_progress_bar(bar: ProgressBar) -> Self {
        Self { bar: Some(bar) }
    }
}

fn suspend_bar<T>(bar: Option<&ProgressBar>, interact: impl FnOnce() -> T) -> T {
    match bar {
        Some(bar) => bar.suspend(interact),
        None => interact(),
    }
}

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn request_secret(&self, provider: ProviderKind) -> Result<Option<String>, SecretError> {
        let prompt = format!("Enter your {} API key ({})", provider, provider.key_hint());

        let bar = self.bar.clone();
        let answer = tokio::task::spawn_blocking(move || {
            suspend_bar(bar.as_ref(), || {
                Password::new()
                    .with_prompt(prompt)
                    .allow_empty_password(true)
                    .interact()
            })
        })
        .await
        .map_err(|e| SecretError::PromptFailed(e.to_string()))?;

        match answer {
            Ok(key) if !key.trim().is_empty() => Ok(Some(key.trim().to_string())),
            Ok(_) => Ok(None),
            Err(e) => {
                // No terminal (hooks, CI) counts as declining.
                warn!("Could not prompt for {} API key: {}", provider, e);
                Ok(None)
            }
        }
    }
}
