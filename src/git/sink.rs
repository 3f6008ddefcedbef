//! Destinations for a generated commit message.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Oid, Repository};
use tracing::{debug, info};

use super::repository::resolve_head_tree;
use crate::error::{CommitError, GitError};
use crate::llm::CommitMessage;

/// Where the final message goes.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink: Send + Sync {
    fn apply(&self, message: &CommitMessage) -> Result<(), CommitError>;
}

/// Prints the message on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn apply(&self, message: &CommitMessage) -> Result<(), CommitError> {
        println!("{message}");
        Ok(())
    }
}

/// Writes the message into a commit message file, as used by the
/// `prepare-commit-msg` hook.
///
/// Comment lines already in the file (git's status template) are kept below
/// the message.
#[derive(Debug, Clone)]
pub struct MessageFileSink {
    path: PathBuf,
}

impl MessageFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MessageSink for MessageFileSink {
    fn apply(&self, message: &CommitMessage) -> Result<(), CommitError> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(CommitError::ApplyFailed(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        let comments: Vec<&str> = existing.lines().filter(|l| l.starts_with('#')).collect();

        let mut content = message.as_str().to_string();
        content.push('\n');
        if !comments.is_empty() {
            content.push('\n');
            content.push_str(&comments.join("\n"));
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(|e| {
            CommitError::ApplyFailed(format!("{}: {e}", self.path.display()))
        })?;
        debug!("Wrote commit message to {}", self.path.display());
        Ok(())
    }
}

/// Creates a commit with the message.
///
/// Commits the current index. When nothing is staged, every working tree
/// change is staged first, matching the unstaged fallback used to build the
/// message.
#[derive(Debug, Clone)]
pub struct GitCommitSink {
    root: PathBuf,
}

impl GitCommitSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl MessageSink for GitCommitSink {
    fn apply(&self, message: &CommitMessage) -> Result<(), CommitError> {
        let repo = Repository::open(&self.root).map_err(GitError::OpenRepository)?;
        let oid = commit_index(&repo, message.as_str())?;
        info!("Created commit {}", oid);
        Ok(())
    }
}

/// Commit the index on HEAD, staging everything when the index matches HEAD.
pub fn commit_index(repo: &Repository, message: &str) -> Result<Oid, GitError> {
    let mut index = repo.index().map_err(GitError::CommitFailed)?;
    let head_tree = resolve_head_tree(repo)?;

    let staged = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
        .map_err(GitError::CommitFailed)?;
    if staged.deltas().len() == 0 {
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(GitError::CommitFailed)?;
        // add_all skips deletions of tracked files.
        index
            .update_all(["*"].iter(), None)
            .map_err(GitError::CommitFailed)?;
        index.write().map_err(GitError::CommitFailed)?;
    }

    let tree_id = index.write_tree().map_err(GitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;
    let sig = repo.signature().map_err(GitError::ConfigError)?;

    let parent = match head_tree {
        Some(_) => Some(
            repo.head()
                .and_then(|h| h.peel_to_commit())
                .map_err(GitError::CommitFailed)?,
        ),
        None => None,
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(GitError::CommitFailed)
}
