//! User configuration loaded from TOML with environment overrides.
//!
//! The file lives at `~/.config/unicommit/config.toml` unless `--config` or
//! `UNICOMMIT_CONFIG` points elsewhere. It is re-read on every generation, so
//! edits apply to the next run without any cache to invalidate.
//!
//! ```toml
//! provider = "anthropic"
//! message_style = "detailed"
//! language = "french"
//!
//! [providers.anthropic]
//! model = "claude-haiku-4-5-20251001"
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 1000
//! backoff_multiplier = 1.5
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::llm::retry::{DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::llm::{Language, MessageStyle, ProviderKind, RetryPolicy};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MAX_TOKENS: u32 = 200;
/// Token budget for the detailed style when none is configured.
pub const DETAILED_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a git commit message generator. Return ONLY the commit message with no additional text, explanations, or prefixes.";
pub const DEFAULT_MAX_DIFF_LENGTH: usize = 3000;

pub const CONFIG_ENV: &str = "UNICOMMIT_CONFIG";
pub const PROVIDER_ENV: &str = "UNICOMMIT_PROVIDER";
pub const STYLE_ENV: &str = "UNICOMMIT_STYLE";
pub const LANGUAGE_ENV: &str = "UNICOMMIT_LANGUAGE";

/// Per-backend overrides under `[providers.<id>]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// The `[retry]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

/// Raw configuration as written by the user.
///
/// Every field is optional; the getters apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Option<String>,
    pub message_style: Option<String>,
    pub language: Option<String>,
    pub custom_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub max_diff_length: Option<usize>,
    pub detect_first_commit: Option<bool>,
    pub providers: BTreeMap<String, ProviderSettings>,
    pub retry: RetrySettings,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Settings {
    /// Parse a TOML document.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configured provider identifier. Unknown identifiers are kept so the
    /// factory can reject them by name.
    pub fn provider_id(&self) -> &str {
        non_blank(&self.provider).unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn message_style(&self) -> MessageStyle {
        match non_blank(&self.message_style) {
            None => MessageStyle::default(),
            Some(raw) => MessageStyle::parse(raw).unwrap_or_else(|| {
                warn!("Unknown message style '{}', using {}", raw, MessageStyle::default());
                MessageStyle::default()
            }),
        }
    }

    pub fn language(&self) -> Language {
        match non_blank(&self.language) {
            None => Language::default(),
            Some(raw) => Language::parse(raw).unwrap_or_else(|| {
                warn!("Unknown language '{}', using {}", raw, Language::default());
                Language::default()
            }),
        }
    }

    /// Template for the custom style; `None` when unset or blank.
    pub fn custom_prompt(&self) -> Option<&str> {
        non_blank(&self.custom_prompt)
    }

    /// Explicit token budget, if configured. Adapters fall back to
    /// [`DEFAULT_MAX_TOKENS`] or [`DETAILED_MAX_TOKENS`].
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens.filter(|&n| n > 0)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
            .filter(|t| t.is_finite())
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn system_prompt(&self) -> &str {
        non_blank(&self.system_prompt).unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn max_diff_length(&self) -> usize {
        self.max_diff_length
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_DIFF_LENGTH)
    }

    pub fn detect_first_commit(&self) -> bool {
        self.detect_first_commit.unwrap_or(true)
    }

    fn provider_settings(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.get(kind.id())
    }

    pub fn model(&self, kind: ProviderKind) -> String {
        self.provider_settings(kind)
            .and_then(|p| non_blank(&p.model))
            .unwrap_or(kind.default_model())
            .to_string()
    }

    pub fn base_url(&self, kind: ProviderKind) -> String {
        self.provider_settings(kind)
            .and_then(|p| non_blank(&p.base_url))
            .unwrap_or(kind.default_base_url())
            .to_string()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            Duration::from_millis(self.retry.delay_ms.unwrap_or(DEFAULT_DELAY_MS)),
            self.retry
                .backoff_multiplier
                .unwrap_or(DEFAULT_BACKOFF_MULTIPLIER),
        )
    }

    /// Apply `UNICOMMIT_PROVIDER`, `UNICOMMIT_STYLE` and `UNICOMMIT_LANGUAGE`.
    pub fn apply_env_overrides(&mut self) {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(provider) = read(PROVIDER_ENV) {
            self.provider = Some(provider);
        }
        if let Some(style) = read(STYLE_ENV) {
            self.message_style = Some(style);
        }
        if let Some(language) = read(LANGUAGE_ENV) {
            self.language = Some(language);
        }
    }
}

/// Where settings come from.
///
/// Called once per generation attempt; implementations must not cache.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<Settings, ConfigError>;
}

/// Fixed, in-memory settings.
impl ConfigSource for Settings {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.clone())
    }
}

/// Settings read from a TOML file, then overridden from the environment.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
    required: bool,
}

impl FileConfigSource {
    /// A file that must exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// Pick the config file: explicit path, then `UNICOMMIT_CONFIG`, then the
    /// default location (which may be absent).
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        Ok(Self {
            path: default_config_path()?,
            required: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<Settings, ConfigError> {
        let mut settings = match fs::read_to_string(&self.path) {
            Ok(content) => Settings::from_toml(&content, &self.path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                debug!("No config file at {}, using defaults", self.path.display());
                Settings::default()
            }
            Err(source) => {
                return Err(ConfigError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        settings.apply_env_overrides();
        Ok(settings)
    }
}

/// `~/.config/unicommit/config.toml` (platform equivalent).
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("unicommit").join("config.toml"))
}
