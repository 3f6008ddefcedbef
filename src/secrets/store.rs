//! Persistent secret storage keyed by provider.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConfigError, SecretError};
use crate::llm::ProviderKind;

/// Key/value store for API keys.
///
/// Implementations must make each `store`/`delete` atomic; callers do no
/// locking of their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SecretError>;
    async fn store(&self, key: &str, value: &str) -> Result<(), SecretError>;
    async fn delete(&self, key: &str) -> Result<(), SecretError>;
}

/// Secrets kept in a JSON file readable only by the current user.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/unicommit/credentials.json` (platform equivalent).
    pub fn default_location() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join("unicommit").join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(SecretError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|source| SecretError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Run file I/O on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, SecretError>
    where
        F: FnOnce(&FileSecretStore) -> Result<T, SecretError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| SecretError::ReadFailed {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })?
    }

    /// Replace the file contents via temp file + rename.
    fn write_all(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        let write_err = |source| SecretError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;

        let json = serde_json::to_string_pretty(secrets).map_err(|e| write_err(e.into()))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        restrict_permissions(tmp.path()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} secret(s) to {}", secrets.len(), self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        let key = key.to_string();
        self.blocking(move |store| Ok(store.read_all()?.remove(&key)))
            .await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking(move |store| {
            let mut secrets = store.read_all()?;
            secrets.insert(key, value);
            store.write_all(&secrets)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), SecretError> {
        let key = key.to_string();
        self.blocking(move |store| {
            let mut secrets = store.read_all()?;
            if secrets.remove(&key).is_some() {
                store.write_all(&secrets)?;
            }
            Ok(())
        })
        .await
    }
}

/// Whether a key-based provider has a stored API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretStatus {
    pub provider: ProviderKind,
    pub stored: bool,
}

/// Stored/not-set status for every key-based provider.
pub async fn secret_status(store: &dyn SecretStore) -> Result<Vec<SecretStatus>, SecretError> {
    let mut statuses = Vec::new();
    for provider in ProviderKind::ALL.into_iter().filter(|p| !p.is_local()) {
        let stored = store
            .get(&provider.secret_key())
            .await?
            .is_some_and(|v| !v.is_empty());
        statuses.push(SecretStatus { provider, stored });
    }
    Ok(statuses)
}

/// Delete every key-based provider's stored key, returning how many existed.
pub async fn clear_secrets(store: &dyn SecretStore) -> Result<usize, SecretError> {
    let mut cleared = 0;
    for status in secret_status(store).await? {
        if status.stored {
            cleared += 1;
        }
        store.delete(&status.provider.secret_key()).await?;
    }
    debug!("Cleared {} stored API keys", cleared);
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileSecretStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("nested").join("credentials.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("unicommit.openai.apiKey").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_get_delete() {
        let (_dir, store) = temp_store();
        store.store("unicommit.openai.apiKey", "sk-test").await.unwrap();
        store.store("unicommit.gemini.apiKey", "AIza-test").await.unwrap();

        assert_eq!(
            store.get("unicommit.openai.apiKey").await.unwrap().as_deref(),
            Some("sk-test")
        );

        store.delete("unicommit.openai.apiKey").await.unwrap();
        assert_eq!(store.get("unicommit.openai.apiKey").await.unwrap(), None);
        assert_eq!(
            store.get("unicommit.gemini.apiKey").await.unwrap().as_deref(),
            Some("AIza-test")
        );
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let (_dir, store) = temp_store();
        store.delete("unicommit.qwen.apiKey").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.store("k", "v").await.unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(
            store.get("k").await,
            Err(SecretError::Corrupt { .. })
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_file_io_runs_off_the_runtime_thread() {
        let (_dir, store) = temp_store();
        let runtime_thread = std::thread::current().id();

        let io_thread = store
            .blocking(|store| {
                store.read_all()?;
                Ok(std::thread::current().id())
            })
            .await
            .unwrap();
        assert_ne!(io_thread, runtime_thread);

        store.store("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_secret_status_skips_local_servers() {
        let (_dir, store) = temp_store();
        store
            .store(&ProviderKind::Mistral.secret_key(), "m-key")
            .await
            .unwrap();

        let statuses = secret_status(&store).await.unwrap();
        assert_eq!(statuses.len(), 7);
        assert!(statuses.iter().all(|s| !s.provider.is_local()));
        assert!(
            statuses
                .iter()
                .find(|s| s.provider == ProviderKind::Mistral)
                .unwrap()
                .stored
        );
        assert!(
            !statuses
                .iter()
                .find(|s| s.provider == ProviderKind::OpenAi)
                .unwrap()
                .stored
        );
    }

    #[tokio::test]
    async fn test_clear_secrets_removes_provider_keys_only() {
        let (_dir, store) = temp_store();
        store.store(&ProviderKind::OpenAi.secret_key(), "sk-1").await.unwrap();
        store.store(&ProviderKind::Qwen.secret_key(), "sk-2").await.unwrap();
        store.store("unrelated", "keep").await.unwrap();

        assert_eq!(clear_secrets(&store).await.unwrap(), 2);
        assert!(secret_status(&store).await.unwrap().iter().all(|s| !s.stored));
        assert_eq!(store.get("unrelated").await.unwrap().as_deref(), Some("keep"));
    }
}
