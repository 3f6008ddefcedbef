//! Repository state consumed by commit message generation.

pub mod repository;
pub mod sink;
pub mod truncate;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::GitError;

pub use repository::GitRepository;
pub use sink::{GitCommitSink, MessageFileSink, MessageSink, StdoutSink};
#[cfg(test)]
pub use sink::MockMessageSink;
pub use truncate::{TRUNCATION_MARKER, smart_truncate_diff};

/// How a path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    TypeChange,
    Conflicted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
            ChangeKind::Renamed => "RENAMED",
            ChangeKind::Copied => "COPIED",
            ChangeKind::Untracked => "UNTRACKED",
            ChangeKind::TypeChange => "TYPECHANGE",
            ChangeKind::Conflicted => "CONFLICTED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed path, rendered as `<KIND> <path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub path: String,
}

impl ChangeEntry {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}

/// Line and file counts across the collected diffs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStatistics {
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
    /// Changed files per extension (`"rs"`, `"md"`, or `"no extension"`).
    pub file_types: BTreeMap<String, usize>,
}

/// Snapshot of pending changes.
///
/// `unstaged` is only populated when unstaged changes were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoChanges {
    pub staged: Vec<ChangeEntry>,
    pub unstaged: Vec<ChangeEntry>,
    pub diff: String,
    pub statistics: Option<DiffStatistics>,
}

impl RepoChanges {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }
}

/// Read access to the repository being committed to.
#[cfg_attr(test, mockall::automock)]
pub trait Workspace: Send + Sync {
    /// Staged changes, plus unstaged and untracked ones when `include_unstaged`.
    fn changes(&self, include_unstaged: bool) -> Result<RepoChanges, GitError>;

    /// True while HEAD is unborn.
    fn is_first_commit(&self) -> Result<bool, GitError>;

    fn smart_truncate_diff(&self, diff: &str, max_length: usize) -> String {
        smart_truncate_diff(diff, max_length)
    }
}
