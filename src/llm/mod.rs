//! Multi-provider commit message generation.
//!
//! Every backend implements [`CommitProvider`]; the [`ProviderFactory`] picks
//! one from configuration. Prompts come from [`build_prompt`] and raw model
//! output goes through [`validate_response`] no matter which backend answered.

pub mod backends;
pub mod credentials;
pub mod factory;
pub mod http;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod retry;

pub use credentials::CredentialResolver;
pub use factory::{ProviderFactory, ProviderSource};
pub use normalize::{CommitMessage, validate_response};
pub use prompt::build_prompt;
pub use provider::{AuthScheme, CommitProvider, ProviderDescriptor, ProviderKind};
pub use request::{GenerationRequest, Language, MessageStyle};
pub use retry::{RetryPolicy, execute_with_retry, execute_with_retry_noting};
