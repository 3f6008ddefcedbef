//! Change collection from a working tree using git2.

use std::path::{Path, PathBuf};

use git2::{Delta, Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tracing::{debug, warn};

use super::{ChangeEntry, ChangeKind, DiffStatistics, RepoChanges, Workspace};
use crate::error::GitError;

const NO_EXTENSION: &str = "no extension";

/// A git repository on disk.
///
/// Holds only the path; the repository is reopened for every query so each
/// generation sees the current index and working tree.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Discover the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(GitError::OpenRepository)?;
        let root = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn open(&self) -> Result<Repository, GitError> {
        Repository::open(&self.root).map_err(GitError::OpenRepository)
    }
}

/// Resolve the HEAD tree, distinguishing an unborn HEAD from real failures.
pub(crate) fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

impl Workspace for GitRepository {
    fn changes(&self, include_unstaged: bool) -> Result<RepoChanges, GitError> {
        let repo = self.open()?;
        let head_tree = resolve_head_tree(&repo)?;

        let mut staged_diff = repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .map_err(GitError::DiffFailed)?;
        staged_diff
            .find_similar(None)
            .map_err(GitError::DiffFailed)?;

        let mut changes = RepoChanges {
            staged: entries(&staged_diff),
            ..Default::default()
        };
        let mut statistics = DiffStatistics::default();
        let mut diff_text = patch_text(&staged_diff, &mut statistics);

        if include_unstaged {
            let mut opts = DiffOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .show_untracked_content(true);
            let unstaged_diff = repo
                .diff_index_to_workdir(None, Some(&mut opts))
                .map_err(GitError::DiffFailed)?;

            changes.unstaged = entries(&unstaged_diff);
            if !changes.unstaged.is_empty() {
                let unstaged_text = patch_text(&unstaged_diff, &mut statistics);
                if !diff_text.is_empty() && !unstaged_text.is_empty() {
                    diff_text.push_str("\n\n");
                }
                diff_text.push_str(&unstaged_text);
            }
        }

        if !changes.is_empty() {
            for entry in changes.staged.iter().chain(&changes.unstaged) {
                *statistics
                    .file_types
                    .entry(extension_of(&entry.path))
                    .or_insert(0) += 1;
            }
            statistics.files_changed = changes.staged.len() + changes.unstaged.len();
            changes.statistics = Some(statistics);
        }

        debug!(
            "Collected {} staged and {} unstaged changes ({} diff chars)",
            changes.staged.len(),
            changes.unstaged.len(),
            diff_text.chars().count()
        );
        changes.diff = diff_text;
        Ok(changes)
    }

    fn is_first_commit(&self) -> Result<bool, GitError> {
        let repo = self.open()?;
        match repo.head() {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(true)
            }
            Err(e) => Err(GitError::DiffFailed(e)),
        }
    }
}

fn change_kind(status: Delta) -> Option<ChangeKind> {
    match status {
        Delta::Added => Some(ChangeKind::Added),
        Delta::Modified | Delta::Unreadable => Some(ChangeKind::Modified),
        Delta::Deleted => Some(ChangeKind::Deleted),
        Delta::Renamed => Some(ChangeKind::Renamed),
        Delta::Copied => Some(ChangeKind::Copied),
        Delta::Untracked => Some(ChangeKind::Untracked),
        Delta::Typechange => Some(ChangeKind::TypeChange),
        Delta::Conflicted => Some(ChangeKind::Conflicted),
        Delta::Unmodified | Delta::Ignored => None,
    }
}

fn entries(diff: &Diff<'_>) -> Vec<ChangeEntry> {
    diff.deltas()
        .filter_map(|delta| {
            let kind = change_kind(delta.status())?;
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())?
                .to_string_lossy()
                .to_string();
            Some(ChangeEntry::new(kind, path))
        })
        .collect()
}

/// Unified patch text for `diff`, counting added and removed lines.
fn patch_text(diff: &Diff<'_>, statistics: &mut DiffStatistics) -> String {
    let mut text = String::new();

    if let Err(e) = diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        match origin {
            '+' => statistics.additions += 1,
            '-' => statistics.deletions += 1,
            _ => {}
        }
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    }) {
        warn!("Failed to render diff text: {e}");
    }

    text
}

fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}
