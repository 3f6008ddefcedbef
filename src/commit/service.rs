//! The generate-and-apply flow.

use std::sync::Arc;

use tracing::{error, info};

use super::format::format_changes;
use super::progress::{NoProgress, Progress};
use crate::config::{ConfigSource, Settings};
use crate::error::CommitError;
use crate::git::{MessageSink, RepoChanges, Workspace};
use crate::llm::{CommitMessage, GenerationRequest, ProviderSource, execute_with_retry_noting};

/// Label used in retry logs and the exhausted-retries error.
pub const GENERATION_LABEL: &str = "Commit message generation";

/// Sequences change collection, provider selection, generation and
/// application of the message.
pub struct CommitService {
    config: Arc<dyn ConfigSource>,
    workspace: Arc<dyn Workspace>,
    providers: Arc<dyn ProviderSource>,
    sink: Arc<dyn MessageSink>,
    progress: Arc<dyn Progress>,
}

impl CommitService {
    pub fn new(
        config: Arc<dyn ConfigSource>,
        workspace: Arc<dyn Workspace>,
        providers: Arc<dyn ProviderSource>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            config,
            workspace,
            providers,
            sink,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Generate a message for the pending changes and hand it to the sink.
    ///
    /// The whole sequence runs under the configured retry policy; after the
    /// last failed attempt the error is `CommitError::RetryExhausted`
    /// wrapping the final cause.
    pub async fn generate_and_apply(&self) -> Result<CommitMessage, CommitError> {
        let policy = self.config.load()?.retry_policy();

        execute_with_retry_noting(
            GENERATION_LABEL,
            &policy,
            || self.attempt(),
            CommitError::is_transient,
            |source, attempts| CommitError::RetryExhausted {
                label: GENERATION_LABEL.to_string(),
                attempts,
                source: Box::new(source),
            },
        )
        .await
        .inspect_err(|e| error!("Failed to generate commit message after all retries: {e}"))
    }

    async fn attempt(&self) -> Result<CommitMessage, CommitError> {
        let settings = self.config.load()?;

        self.progress.report(20, "Getting git changes...");
        let changes = self.collect_changes()?;
        let is_first_commit =
            settings.detect_first_commit() && self.workspace.is_first_commit()?;

        self.progress.report(40, "Preparing AI provider...");
        let provider = self.providers.create(&settings)?;
        if !provider.is_configured().await? {
            return Err(CommitError::InvalidConfiguration(format!(
                "{} is not ready. Please check your settings.",
                provider.kind()
            )));
        }

        self.progress.report(60, "Generating commit message...");
        let request = build_request(&settings, &changes, is_first_commit, self.workspace.as_ref());
        let message = provider.generate(request).await?;

        self.progress.report(80, "Setting commit message...");
        self.sink.apply(&message)?;

        self.progress.report(100, "Complete!");
        info!("Commit message generated successfully: \"{}\"", message);
        Ok(message)
    }

    /// Staged changes, falling back to unstaged ones when nothing is staged.
    fn collect_changes(&self) -> Result<RepoChanges, CommitError> {
        let staged = self.workspace.changes(false)?;
        if !staged.staged.is_empty() {
            return Ok(staged);
        }

        let all = self.workspace.changes(true)?;
        if all.unstaged.is_empty() {
            return Err(CommitError::NoChanges);
        }
        Ok(all)
    }
}

fn build_request(
    settings: &Settings,
    changes: &RepoChanges,
    is_first_commit: bool,
    workspace: &dyn Workspace,
) -> GenerationRequest {
    GenerationRequest {
        raw_changes: format_changes(changes, settings.max_diff_length(), workspace),
        style: settings.message_style(),
        language: settings.language(),
        custom_prompt_template: settings.custom_prompt().map(str::to_string),
        temperature: Some(settings.temperature()),
        max_tokens: settings.max_tokens(),
        system_prompt: Some(settings.system_prompt().to_string()),
        is_first_commit,
    }
}
