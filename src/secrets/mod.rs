//! API key storage and interactive entry.

pub mod prompt;
pub mod store;

pub use prompt::{CredentialPrompt, TerminalPrompt};
pub use store::{FileSecretStore, SecretStatus, SecretStore, clear_secrets, secret_status};
