//! unicommit - commit message generation across many LLM providers.
//!
//! # Overview
//!
//! unicommit collects the staged (or, failing that, unstaged) changes of a git
//! repository, asks the configured backend (OpenAI, Anthropic, Gemini,
//! Mistral, DeepSeek, OpenRouter, Qwen, Ollama or LM Studio) for a commit
//! message in the requested style and language, normalizes the answer and
//! hands it to a sink: stdout, a commit message file, or a new commit.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod logging;
pub mod secrets;

// Re-export commonly used types
pub use commit::{CommitService, Progress};
pub use config::{ConfigSource, FileConfigSource, Settings};
pub use error::{CommitError, ConfigError, GitError, SecretError};
pub use git::{GitRepository, MessageSink, RepoChanges, Workspace};
pub use llm::{
    CommitMessage, CommitProvider, GenerationRequest, Language, MessageStyle, ProviderFactory,
    ProviderKind, RetryPolicy,
};
pub use secrets::{FileSecretStore, SecretStore};
