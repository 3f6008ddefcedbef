//! Error types for unicommit modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::ProviderKind;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

/// Errors from the secret store and credential prompt.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Failed to read secret store {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write secret store {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential prompt failed: {0}")]
    PromptFailed(String),
}

/// Errors from commit message generation.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No changes found to commit")]
    NoChanges,

    #[error("Provider configuration is invalid: {0}")]
    InvalidConfiguration(String),

    #[error("{provider} API key is required")]
    MissingCredential { provider: ProviderKind },

    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),

    #[error("{backend} API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider {
        backend: ProviderKind,
        status: Option<u16>,
        message: String,
    },

    #[error("Empty response from AI provider")]
    EmptyResponse,

    #[error("Cannot connect to {backend} at {url}. Make sure the {backend} server is running.")]
    LocalServerUnreachable { backend: ProviderKind, url: String },

    #[error("{label} failed after {attempts} attempts. Last error: {source}")]
    RetryExhausted {
        label: String,
        attempts: u32,
        #[source]
        source: Box<CommitError>,
    },

    #[error("Failed to apply commit message: {0}")]
    ApplyFailed(String),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl CommitError {
    /// The innermost error, looking through any `RetryExhausted` wrappers.
    pub fn root_cause(&self) -> &CommitError {
        match self {
            CommitError::RetryExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Retries do not consult this; it only drives the warning logged when a
    /// deterministic failure is retried anyway.
    pub fn is_transient(&self) -> bool {
        match self {
            CommitError::Provider { .. }
            | CommitError::EmptyResponse
            | CommitError::LocalServerUnreachable { .. }
            | CommitError::ApplyFailed(_)
            | CommitError::Git(_) => true,
            CommitError::RetryExhausted { source, .. } => source.is_transient(),
            CommitError::NoChanges
            | CommitError::InvalidConfiguration(_)
            | CommitError::MissingCredential { .. }
            | CommitError::UnsupportedProvider(_)
            | CommitError::Config(_)
            | CommitError::Secret(_) => false,
        }
    }
}
