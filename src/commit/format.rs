//! Rendering collected changes into the text sent to a provider.

use std::fmt::Write as _;

use crate::git::{ChangeEntry, RepoChanges, Workspace};

/// Appended after a diff that had to be shortened.
pub const TRUNCATION_NOTE: &str = "\n... (truncated for brevity)";

/// Render statistics, change lists and the diff.
///
/// A diff longer than `max_diff_length` chars goes through the workspace's
/// boundary-aware truncation.
pub fn format_changes(changes: &RepoChanges, max_diff_length: usize, workspace: &dyn Workspace) -> String {
    let mut out = String::new();

    if let Some(stats) = &changes.statistics {
        out.push_str("Change Summary:\n");
        let _ = writeln!(out, "  Files changed: {}", stats.files_changed);
        let _ = writeln!(out, "  Insertions: +{}", stats.additions);
        let _ = writeln!(out, "  Deletions: -{}", stats.deletions);
        if !stats.file_types.is_empty() {
            let types: Vec<String> = stats
                .file_types
                .iter()
                .map(|(ext, count)| format!("{ext} ({count})"))
                .collect();
            let _ = writeln!(out, "  File types: {}", types.join(", "));
        }
        out.push('\n');
    }

    push_section(&mut out, "Staged changes", &changes.staged);
    push_section(&mut out, "Unstaged changes", &changes.unstaged);

    if !changes.diff.trim().is_empty() {
        out.push_str("Diff:\n");
        if changes.diff.chars().count() > max_diff_length {
            out.push_str(&workspace.smart_truncate_diff(&changes.diff, max_diff_length));
            out.push_str(TRUNCATION_NOTE);
        } else {
            out.push_str(&changes.diff);
        }
    }

    out
}

fn push_section(out: &mut String, title: &str, entries: &[ChangeEntry]) {
    if entries.is_empty() {
        return;
    }
    let lines: Vec<String> = entries.iter().map(|e| format!("  {e}")).collect();
    let _ = write!(out, "{title}:\n{}\n\n", lines.join("\n"));
}
