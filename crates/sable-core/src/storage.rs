//! File-backed store implementations and configuration I/O
//!
//! Both stores persist opaque strings only: the verification token and
//! the encrypted vault blob. Writes are atomic (write to temp, then
//! rename) and files are restricted to the owner on Unix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::error::{VaultError, VaultResult};
use crate::kdf::VerificationToken;
use crate::models::{VaultBlob, VaultConfig};
use crate::store::{BlobStore, TokenStore};

/// Default vault directory name
const VAULT_DIR: &str = ".sable-vault";

/// Config file name
const CONFIG_FILE: &str = "config.toml";

/// Get the default vault directory path
pub fn default_vault_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(VAULT_DIR)
}

/// Ensure the vault directory exists with owner-only permissions
pub async fn ensure_vault_dir(base_dir: &Path) -> VaultResult<()> {
    if !base_dir.exists() {
        fs::create_dir_all(base_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(base_dir, perms)?;
        }
    }
    Ok(())
}

/// Write a file atomically (temp + rename) with owner-only permissions
async fn write_atomic(path: &Path, contents: &str) -> VaultResult<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp_path, perms)?;
    }

    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Read a file, mapping "not found" to `None`
async fn read_optional(path: &Path) -> VaultResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Verification-token store backed by one file per user
///
/// Stand-in for the remote document store in single-machine deployments;
/// holds only the non-secret token.
pub struct FileTokenStore {
    base_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn token_path(&self, user_id: &str) -> PathBuf {
        self.base_dir.join(format!("{user_id}.token"))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get_token(&self, user_id: &str) -> VaultResult<Option<VerificationToken>> {
        Ok(read_optional(&self.token_path(user_id))
            .await?
            .map(|s| VerificationToken::from_string(s.trim_end().to_string())))
    }

    async fn put_token(&self, user_id: &str, token: &VerificationToken) -> VaultResult<()> {
        ensure_vault_dir(&self.base_dir).await?;
        write_atomic(&self.token_path(user_id), token.as_str()).await
    }
}

/// Vault-blob store backed by one file per user, keyed `credentials_<id>`
pub struct FileBlobStore {
    base_dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn blob_path(&self, user_id: &str) -> PathBuf {
        self.base_dir.join(format!("credentials_{user_id}.vault"))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn load_blob(&self, user_id: &str) -> VaultResult<Option<VaultBlob>> {
        Ok(read_optional(&self.blob_path(user_id))
            .await?
            .map(|s| VaultBlob::from_encoded(s.trim_end().to_string())))
    }

    async fn store_blob(&self, user_id: &str, blob: &VaultBlob) -> VaultResult<()> {
        ensure_vault_dir(&self.base_dir).await?;
        write_atomic(&self.blob_path(user_id), blob.as_str()).await
    }
}

/// Load vault configuration, defaulting when absent
///
/// The KDF iteration count is tunable upward only; values below the
/// floor are clamped.
pub async fn load_config(base_dir: &Path) -> VaultResult<VaultConfig> {
    let config_path = base_dir.join(CONFIG_FILE);

    let mut config = match read_optional(&config_path).await? {
        Some(contents) => {
            toml::from_str::<VaultConfig>(&contents).map_err(|e| VaultError::Config(e.to_string()))?
        }
        None => VaultConfig::default(),
    };

    if config.kdf_iterations < VaultConfig::MIN_KDF_ITERATIONS {
        warn!(
            configured = config.kdf_iterations,
            floor = VaultConfig::MIN_KDF_ITERATIONS,
            "kdf iteration count below floor, clamping"
        );
        config.kdf_iterations = VaultConfig::MIN_KDF_ITERATIONS;
    }

    Ok(config)
}

/// Save vault configuration
pub async fn save_config(base_dir: &Path, config: &VaultConfig) -> VaultResult<()> {
    ensure_vault_dir(base_dir).await?;

    let contents =
        toml::to_string_pretty(config).map_err(|e| VaultError::Config(e.to_string()))?;
    write_atomic(&base_dir.join(CONFIG_FILE), &contents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_token_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path());

        assert!(store.get_token("alice").await.unwrap().is_none());

        let token = VerificationToken::from_string("b3BhcXVl".to_string());
        store.put_token("alice", &token).await.unwrap();
        assert_eq!(store.get_token("alice").await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_blob_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path());

        assert!(store.load_blob("alice").await.unwrap().is_none());

        let blob = VaultBlob::from_encoded("bm9uY2VjaXBoZXJ0ZXh0".to_string());
        store.store_blob("alice", &blob).await.unwrap();
        assert_eq!(store.load_blob("alice").await.unwrap(), Some(blob));

        // Other users see nothing.
        assert!(store.load_blob("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blob_overwrite_keeps_latest() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path());

        store
            .store_blob("alice", &VaultBlob::from_encoded("Zmlyc3Q=".to_string()))
            .await
            .unwrap();
        store
            .store_blob("alice", &VaultBlob::from_encoded("c2Vjb25k".to_string()))
            .await
            .unwrap();

        assert_eq!(
            store.load_blob("alice").await.unwrap().unwrap().as_str(),
            "c2Vjb25k"
        );
    }

    #[tokio::test]
    async fn test_config_defaults_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(temp_dir.path()).await.unwrap();
        assert_eq!(config.kdf_iterations, VaultConfig::default().kdf_iterations);
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config = VaultConfig {
            kdf_iterations: 250_000,
        };

        save_config(temp_dir.path(), &config).await.unwrap();
        let loaded = load_config(temp_dir.path()).await.unwrap();
        assert_eq!(loaded.kdf_iterations, 250_000);
    }

    #[tokio::test]
    async fn test_config_iterations_clamped_to_floor() {
        let temp_dir = TempDir::new().unwrap();
        save_config(
            temp_dir.path(),
            &VaultConfig {
                kdf_iterations: 1_000,
            },
        )
        .await
        .unwrap();

        let loaded = load_config(temp_dir.path()).await.unwrap();
        assert_eq!(loaded.kdf_iterations, VaultConfig::MIN_KDF_ITERATIONS);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path());
        store
            .put_token("alice", &VerificationToken::from_string("t".to_string()))
            .await
            .unwrap();

        let meta = std::fs::metadata(temp_dir.path().join("alice.token")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }
}
