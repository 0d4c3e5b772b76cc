//! Collaborator seams for the vault core
//!
//! The identity provider, the remote document store (verification token
//! only), the local device blob store and the ephemeral session store are
//! all external to the core. They are modeled as traits so the session
//! can be constructed with real backends in production and in-memory ones
//! in tests.
//!
//! Nothing behind these seams ever receives the master password or the
//! raw key: the remote store holds only the one-way verification token,
//! and the session store holds the key encoding for the session's
//! lifetime only.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::VaultResult;
use crate::kdf::VerificationToken;
use crate::models::VaultBlob;

/// Remote document store: one verification token per user, nothing else
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_token(&self, user_id: &str) -> VaultResult<Option<VerificationToken>>;
    async fn put_token(&self, user_id: &str, token: &VerificationToken) -> VaultResult<()>;
}

/// Local device storage for the encrypted vault blob
///
/// Keyed by `credentials_<user_id>`; the blob is opaque to the store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn load_blob(&self, user_id: &str) -> VaultResult<Option<VaultBlob>>;
    async fn store_blob(&self, user_id: &str, blob: &VaultBlob) -> VaultResult<()>;
}

/// Session-scoped ephemeral key holder
///
/// Holds the base64 encoding of the raw key under a fixed name for the
/// session's duration; must be cleared on lock/logout. Never durable.
pub trait SessionStore: Send + Sync {
    fn put_key(&self, encoded: SecretString);
    fn get_key(&self) -> Option<SecretString>;
    fn clear(&self);
}

/// Identity provider hook
///
/// Account creation/login live entirely outside the core; the core only
/// consumes the opaque user id and signals session termination.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn user_id(&self) -> &str;
    async fn logout(&self) -> VaultResult<()>;
}

/// In-memory token store (tests and single-process setups)
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, VerificationToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self, user_id: &str) -> VaultResult<Option<VerificationToken>> {
        Ok(self.tokens.lock().expect("token store poisoned").get(user_id).cloned())
    }

    async fn put_token(&self, user_id: &str, token: &VerificationToken) -> VaultResult<()> {
        self.tokens
            .lock()
            .expect("token store poisoned")
            .insert(user_id.to_string(), token.clone());
        Ok(())
    }
}

/// In-memory blob store (tests and single-process setups)
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, VaultBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str) -> String {
        format!("credentials_{user_id}")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn load_blob(&self, user_id: &str) -> VaultResult<Option<VaultBlob>> {
        Ok(self
            .blobs
            .lock()
            .expect("blob store poisoned")
            .get(&Self::key(user_id))
            .cloned())
    }

    async fn store_blob(&self, user_id: &str, blob: &VaultBlob) -> VaultResult<()> {
        self.blobs
            .lock()
            .expect("blob store poisoned")
            .insert(Self::key(user_id), blob.clone());
        Ok(())
    }
}

/// Process-lifetime session store
///
/// The production implementation: the encoded key lives on the heap for
/// the lifetime of this value and is dropped (and zeroized by `secrecy`)
/// on clear.
#[derive(Default)]
pub struct MemorySessionStore {
    key: Mutex<Option<SecretString>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put_key(&self, encoded: SecretString) {
        *self.key.lock().expect("session store poisoned") = Some(encoded);
    }

    fn get_key(&self) -> Option<SecretString> {
        self.key.lock().expect("session store poisoned").clone()
    }

    fn clear(&self) {
        *self.key.lock().expect("session store poisoned") = None;
    }
}

/// Identity provider for a purely local account
///
/// No remote identity session to terminate; logout is a no-op beyond the
/// lock the session performs itself.
pub struct LocalIdentity {
    user_id: String,
}

impl LocalIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn logout(&self) -> VaultResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_memory_token_store() {
        let store = MemoryTokenStore::new();
        assert!(store.get_token("alice").await.unwrap().is_none());

        let token = VerificationToken::from_string("opaque".to_string());
        store.put_token("alice", &token).await.unwrap();

        assert_eq!(store.get_token("alice").await.unwrap(), Some(token));
        assert!(store.get_token("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_blob_store_partitions_by_user() {
        let store = MemoryBlobStore::new();
        let blob = VaultBlob::from_encoded("opaque-bytes".to_string());

        store.store_blob("alice", &blob).await.unwrap();
        assert_eq!(store.load_blob("alice").await.unwrap(), Some(blob));
        assert!(store.load_blob("bob").await.unwrap().is_none());
    }

    #[test]
    fn test_session_store_clear() {
        let store = MemorySessionStore::new();
        store.put_key(SecretString::new("ZW5jb2RlZA==".to_string()));
        assert_eq!(store.get_key().unwrap().expose_secret(), "ZW5jb2RlZA==");

        store.clear();
        assert!(store.get_key().is_none());
    }
}
