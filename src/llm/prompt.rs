//! Prompt construction for AI-generated commit messages.
//!
//! Everything here is a pure function of its inputs: the same changes, style,
//! template, language, and first-commit flag always produce the same prompt.

use crate::llm::request::{GenerationRequest, Language, MessageStyle};

/// Placeholder substituted in custom templates.
pub const CHANGES_PLACEHOLDER: &str = "{changes}";

const CONVENTIONAL_INSTRUCTIONS: &str = r#"Generate a conventional commit message using the format: type(scope): description. Use these common types: feat (new feature), fix (bug fix), docs (documentation), style (formatting), refactor (code restructuring), test (testing), chore (maintenance), build (build system), ci (continuous integration), perf (performance), revert (revert changes). Scope is optional but helpful. Use imperative mood (e.g., "add" not "added"). Keep under 72 characters. Examples: "feat(auth): add user login validation" or "fix: resolve database connection timeout"."#;

const CONCISE_INSTRUCTIONS: &str = r#"Generate a concise, direct commit message without type prefix. Use imperative mood and focus on the most important change. Target 50-60 characters but prioritize clarity over strict length limits. Examples: "Add user authentication system" or "Fix login validation bug"."#;

const DETAILED_INSTRUCTIONS: &str = "Generate a detailed commit message with this exact structure:
Line 1: Conventional format title under 72 characters (type(scope): description)
Line 2: Blank line
Line 3+: Detailed explanation covering what changed, why it was changed, and the impact. Use bullet points for multiple specific changes.

Example format:
feat(auth): implement OAuth2 login system

- Add OAuth2 authentication flow with Google and GitHub providers
- Create user session management with JWT tokens
- Implement role-based access control for admin features
- Update login UI with provider selection buttons

This change improves security and provides users with convenient social login options while maintaining backward compatibility with email/password authentication.";

const DEFAULT_INSTRUCTIONS: &str = "Generate an appropriate commit message using best practices.";

const ENGLISH_INSTRUCTIONS: &str =
    "Respond in English. Use imperative mood like 'add', 'fix', 'update'.";

const KEEP_TYPES_IN_ENGLISH: &str = " Keep type prefixes (feat, fix, docs, etc.) in English for tooling compatibility, but translate the description.";

/// Build the LLM prompt for generating a commit message.
///
/// Precedence:
/// 1. `Custom` style with a non-blank template: the template with the first
///    `{changes}` replaced by `changes` verbatim, nothing else.
/// 2. First commit: a fixed project-initialization prompt, ignoring style.
/// 3. Otherwise the shared preamble, the style block, and the language suffix.
///
/// `Custom` without a usable template uses the default block, exactly as if
/// no style had been chosen.
pub fn build_prompt(
    changes: &str,
    style: MessageStyle,
    custom_template: Option<&str>,
    language: Language,
    is_first_commit: bool,
) -> String {
    if style == MessageStyle::Custom
        && let Some(template) = custom_template.filter(|t| !t.trim().is_empty())
    {
        return template.replacen(CHANGES_PLACEHOLDER, changes, 1);
    }

    if is_first_commit {
        return build_first_commit_prompt(changes, language);
    }

    let style_instructions = match style {
        MessageStyle::Conventional => CONVENTIONAL_INSTRUCTIONS,
        MessageStyle::Concise => CONCISE_INSTRUCTIONS,
        MessageStyle::Detailed => DETAILED_INSTRUCTIONS,
        MessageStyle::Custom => DEFAULT_INSTRUCTIONS,
    };

    format!(
        "Based on the following git changes, generate a commit message:\n\n{changes}\n\n{style_instructions} {}",
        language_instructions(language, style)
    )
}

/// Build the prompt for a [`GenerationRequest`].
pub fn build_request_prompt(request: &GenerationRequest) -> String {
    build_prompt(
        &request.raw_changes,
        request.style,
        request.custom_template(),
        request.language,
        request.is_first_commit,
    )
}

/// Prompt used when the repository has no commits yet.
fn build_first_commit_prompt(changes: &str, language: Language) -> String {
    format!(
        r#"This is the first commit of a new project. Based on the following initial files and changes, generate a commit message that describes initializing the project:

{changes}

Frame it as a project initialization, for example "chore: initialize <project type> project" or "feat: initial project setup with <key components>". Mention the main technologies or components being set up when they are evident from the files. Keep the first line under 72 characters. {}"#,
        language_instructions(language, MessageStyle::Conventional)
    )
}

/// Language suffix appended to every non-custom prompt.
pub fn language_instructions(language: Language, style: MessageStyle) -> String {
    let style_note = match style {
        MessageStyle::Conventional | MessageStyle::Detailed => KEEP_TYPES_IN_ENGLISH,
        MessageStyle::Concise | MessageStyle::Custom => "",
    };

    let instruction = match language {
        Language::English => return ENGLISH_INSTRUCTIONS.to_string(),
        Language::Spanish => {
            "Respond in Spanish (Español). Use infinitive or imperative forms like 'añadir', 'corregir', 'actualizar'."
        }
        Language::French => {
            "Respond in French (Français). Use infinitive forms like 'ajouter', 'corriger', 'mettre à jour'."
        }
        Language::Chinese => {
            "Respond in Chinese (中文). Use action-oriented verbs like '添加', '修复', '更新'."
        }
        Language::Russian => {
            "Respond in Russian (Русский). Use infinitive forms like 'добавить', 'исправить', 'обновить'."
        }
        Language::Vietnamese => {
            "Respond in Vietnamese (Tiếng Việt). Use action verbs like 'thêm', 'sửa', 'cập nhật'."
        }
        Language::Japanese => {
            "Respond in Japanese (日本語). Use verb forms like '追加', '修正', '更新' with appropriate particles."
        }
        Language::Korean => {
            "Respond in Korean (한국어). Use action verbs like '추가', '수정', '업데이트'."
        }
    };

    format!("{instruction}{style_note}")
}
