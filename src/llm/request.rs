//! Per-invocation generation inputs.

use std::fmt;

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageStyle {
    #[default]
    Conventional,
    Concise,
    Detailed,
    Custom,
}

impl MessageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStyle::Conventional => "conventional",
            MessageStyle::Concise => "concise",
            MessageStyle::Detailed => "detailed",
            MessageStyle::Custom => "custom",
        }
    }

    /// Parse a configuration value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "conventional" => Some(MessageStyle::Conventional),
            "concise" => Some(MessageStyle::Concise),
            "detailed" => Some(MessageStyle::Detailed),
            "custom" => Some(MessageStyle::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for MessageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural language the commit message is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Chinese,
    Spanish,
    French,
    Russian,
    Japanese,
    Korean,
    Vietnamese,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::English,
        Language::Chinese,
        Language::Spanish,
        Language::French,
        Language::Russian,
        Language::Japanese,
        Language::Korean,
        Language::Vietnamese,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Chinese => "chinese",
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::Russian => "russian",
            Language::Japanese => "japanese",
            Language::Korean => "korean",
            Language::Vietnamese => "vietnamese",
        }
    }

    /// Parse a configuration value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Language::ALL.into_iter().find(|l| l.as_str() == value)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an adapter needs for one generation call.
///
/// Built fresh by the commit service for every attempt and moved into the
/// adapter; nothing keeps it after the call returns.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub raw_changes: String,
    pub style: MessageStyle,
    pub language: Language,
    /// Template containing a `{changes}` placeholder, used with [`MessageStyle::Custom`].
    pub custom_prompt_template: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub is_first_commit: bool,
}

impl GenerationRequest {
    pub fn new(raw_changes: impl Into<String>) -> Self {
        Self {
            raw_changes: raw_changes.into(),
            ..Default::default()
        }
    }

    /// The custom template, if one is usable (present and not blank).
    pub fn custom_template(&self) -> Option<&str> {
        self.custom_prompt_template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}
