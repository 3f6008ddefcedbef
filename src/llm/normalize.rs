//! Post-processing of free-text model output into a usable commit message.

use std::fmt;

use tracing::{error, info, warn};

use crate::error::CommitError;
use crate::llm::request::MessageStyle;

/// Length cap for every style except detailed.
pub const MAX_STANDARD_LENGTH: usize = 200;

/// Length cap for the detailed style.
pub const MAX_DETAILED_LENGTH: usize = 1000;

/// A normalized, non-empty commit message.
///
/// Only [`validate_response`] constructs one, so holding a `CommitMessage`
/// implies the length caps have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage(String);

impl CommitMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate and normalize raw model output for the given style.
///
/// Trims the text, drops one layer of quotes or backticks wrapping the whole
/// response, then enforces the style's length cap. Lengths count chars.
pub fn validate_response(raw: &str, style: MessageStyle) -> Result<CommitMessage, CommitError> {
    let text = strip_wrapping_quotes(raw.trim());

    if text.is_empty() {
        error!("AI provider returned empty response");
        return Err(CommitError::EmptyResponse);
    }

    let message = match style {
        MessageStyle::Detailed => validate_detailed(text),
        _ => validate_standard(text),
    };

    Ok(CommitMessage(message))
}

fn validate_standard(text: &str) -> String {
    let length = text.chars().count();
    if length > MAX_STANDARD_LENGTH {
        warn!(
            "AI response truncated from {} to {} characters",
            length, MAX_STANDARD_LENGTH
        );
        let cut = byte_offset(text, MAX_STANDARD_LENGTH);
        return text[..cut].trim_end().to_string();
    }

    info!("AI response validated successfully: \"{}\"", text);
    text.to_string()
}

fn validate_detailed(text: &str) -> String {
    let length = text.chars().count();
    if length > MAX_DETAILED_LENGTH {
        warn!(
            "AI response truncated from {} to {} characters",
            length, MAX_DETAILED_LENGTH
        );
        let truncated = &text[..byte_offset(text, MAX_DETAILED_LENGTH)];
        let kept = match truncated.rfind('\n') {
            Some(newline) if newline > 0 => &truncated[..newline],
            _ => truncated,
        };
        return kept.trim().to_string();
    }

    info!(
        "AI detailed response validated successfully: {} lines",
        text.lines().count()
    );
    text.to_string()
}

/// Byte offset of the `chars`-th char, or the string length if shorter.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if text.len() >= 2
            && text.starts_with(quote)
            && text.ends_with(quote)
            && !text.starts_with("```")
        {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STYLES: [MessageStyle; 4] = [
        MessageStyle::Conventional,
        MessageStyle::Concise,
        MessageStyle::Detailed,
        MessageStyle::Custom,
    ];

    #[test]
    fn test_empty_and_whitespace_fail_for_every_style() {
        for style in ALL_STYLES {
            for raw in ["", "   ", "\n\t \n"] {
                assert!(
                    matches!(validate_response(raw, style), Err(CommitError::EmptyResponse)),
                    "style {style} input {raw:?}"
                );
            }
        }
    }

    #[test]
    fn test_short_message_is_trimmed() {
        let message = validate_response("  feat: add login\n", MessageStyle::Conventional).unwrap();
        assert_eq!(message.as_str(), "feat: add login");
    }

    #[test]
    fn test_standard_cap_hard_truncates_at_200() {
        let raw = "a".repeat(250);
        let message = validate_response(&raw, MessageStyle::Conventional).unwrap();
        assert_eq!(message.as_str().chars().count(), 200);
    }

    #[test]
    fn test_standard_cap_trims_trailing_whitespace_after_cut() {
        let raw = format!("{}   {}", "b".repeat(198), "c".repeat(60));
        let message = validate_response(&raw, MessageStyle::Concise).unwrap();
        assert_eq!(message.as_str(), "b".repeat(198));
    }

    #[test]
    fn test_standard_cap_counts_chars_not_bytes() {
        let raw = "é".repeat(210);
        let message = validate_response(&raw, MessageStyle::Custom).unwrap();
        assert_eq!(message.as_str().chars().count(), 200);
    }

    #[test]
    fn test_detailed_backtracks_to_last_newline() {
        let raw = format!("{}\n{}", "x".repeat(900), "y".repeat(599));
        assert_eq!(raw.chars().count(), 1500);
        let message = validate_response(&raw, MessageStyle::Detailed).unwrap();
        assert_eq!(message.as_str(), "x".repeat(900));
    }

    #[test]
    fn test_detailed_without_newline_uses_hard_cutoff() {
        let raw = "z".repeat(1500);
        let message = validate_response(&raw, MessageStyle::Detailed).unwrap();
        assert_eq!(message.as_str(), "z".repeat(1000));
    }

    #[test]
    fn test_detailed_ignores_newline_after_cutoff() {
        let raw = format!("{}\n{}", "q".repeat(1200), "r".repeat(10));
        let message = validate_response(&raw, MessageStyle::Detailed).unwrap();
        assert_eq!(message.as_str(), "q".repeat(1000));
    }

    #[test]
    fn test_detailed_under_cap_is_untouched() {
        let raw = "feat(auth): add oauth\n\n- Add Google provider\n- Add GitHub provider";
        let message = validate_response(raw, MessageStyle::Detailed).unwrap();
        assert_eq!(message.as_str(), raw);
    }

    #[test]
    fn test_wrapping_quotes_are_stripped() {
        let message = validate_response("\"fix: handle timeout\"", MessageStyle::Conventional).unwrap();
        assert_eq!(message.as_str(), "fix: handle timeout");

        let message = validate_response("`docs: update readme`", MessageStyle::Concise).unwrap();
        assert_eq!(message.as_str(), "docs: update readme");
    }

    #[test]
    fn test_quote_only_response_is_empty() {
        assert!(matches!(
            validate_response("\"  \"", MessageStyle::Conventional),
            Err(CommitError::EmptyResponse)
        ));
    }

    #[test]
    fn test_inner_quotes_are_kept() {
        let raw = "fix: handle \"quoted\" names";
        let message = validate_response(raw, MessageStyle::Conventional).unwrap();
        assert_eq!(message.as_str(), raw);
    }
}
