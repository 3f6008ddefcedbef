//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use unicommit::config::{ProviderSettings, RetrySettings};
use unicommit::error::{CommitError, SecretError};
use unicommit::git::MessageSink;
use unicommit::llm::ProviderKind;
use unicommit::secrets::{CredentialPrompt, SecretStore};
use unicommit::{CommitMessage, Settings};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root.
    pub fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Add a path to the index.
    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit the current index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Write, stage and commit a single file.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        self.write(name, content);
        self.stage(name);
        self.commit(message)
    }

    /// Message of the commit HEAD points at.
    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit")
            .message()
            .unwrap_or_default()
            .to_string()
    }

    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }
}

/// Secret store held in memory.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn with_key(provider: ProviderKind, key: &str) -> Self {
        let store = Self::default();
        store
            .secrets
            .lock()
            .unwrap()
            .insert(provider.secret_key(), key.to_string());
        store
    }

    pub fn key_for(&self, provider: ProviderKind) -> Option<String> {
        self.secrets.lock().unwrap().get(&provider.secret_key()).cloned()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.secrets.lock().unwrap().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.secrets
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.secrets.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Credential prompt that gives a fixed answer and counts how often it was asked.
pub struct ScriptedPrompt {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn answering(key: &str) -> Self {
        Self {
            answer: Some(key.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialPrompt for ScriptedPrompt {
    async fn request_secret(&self, _provider: ProviderKind) -> Result<Option<String>, SecretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Sink that remembers every message it was handed.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn apply(&self, message: &CommitMessage) -> Result<(), CommitError> {
        self.messages.lock().unwrap().push(message.as_str().to_string());
        Ok(())
    }
}

/// Env lookup that never finds a key, so tests ignore the developer's shell.
pub fn no_env(_: &str) -> Option<String> {
    None
}

/// Settings selecting `provider`, pointed at a mock server, with fast retries.
pub fn settings_for(provider: ProviderKind, base_url: &str) -> Settings {
    let mut settings = Settings {
        provider: Some(provider.id().to_string()),
        retry: RetrySettings {
            max_attempts: Some(2),
            delay_ms: Some(1),
            backoff_multiplier: Some(1.0),
        },
        ..Default::default()
    };
    settings.providers.insert(
        provider.id().to_string(),
        ProviderSettings {
            model: Some(format!("{}-test", provider.id())),
            base_url: Some(base_url.to_string()),
        },
    );
    settings
}

/// A local URL nothing is listening on.
pub fn unused_local_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
