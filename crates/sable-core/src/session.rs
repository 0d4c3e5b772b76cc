//! Session key lifecycle and vault access
//!
//! A [`VaultSession`] is the single owned handle to a user's vault. It
//! moves between two states: LOCKED (no key held) and UNLOCKED (raw key
//! held in memory, mirrored base64 into the ephemeral session store).
//! Every credential read/write path is gated on the UNLOCKED state; an
//! attempt while locked is a caller bug surfaced as
//! [`VaultError::VaultLocked`].
//!
//! Within one session there is exactly one raw key, and all vault
//! mutations go through `&mut self`, so writes against the same blob are
//! serialized by construction. Callers wanting multi-writer safety
//! across sessions must add their own versioning.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cipher;
use crate::error::{VaultError, VaultResult};
use crate::kdf::{self, RawKey, KDF_SALT};
use crate::models::{Credential, CredentialCollection, CredentialUpdate, VaultConfig};
use crate::store::{BlobStore, IdentityProvider, SessionStore, TokenStore};

/// Owned session handle for one user's vault
pub struct VaultSession {
    config: VaultConfig,
    identity: Arc<dyn IdentityProvider>,
    tokens: Arc<dyn TokenStore>,
    blobs: Arc<dyn BlobStore>,
    session_store: Arc<dyn SessionStore>,
    /// The raw key; `None` == LOCKED
    key: Option<RawKey>,
}

impl VaultSession {
    pub fn new(
        config: VaultConfig,
        identity: Arc<dyn IdentityProvider>,
        tokens: Arc<dyn TokenStore>,
        blobs: Arc<dyn BlobStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            identity,
            tokens,
            blobs,
            session_store,
            key: None,
        }
    }

    pub fn user_id(&self) -> &str {
        self.identity.user_id()
    }

    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Whether a master password has been set up for this user
    pub async fn has_master_password(&self) -> VaultResult<bool> {
        Ok(self.tokens.get_token(self.user_id()).await?.is_some())
    }

    /// First-time setup: derive the key, persist the verification token
    ///
    /// Usable only once; errors if a token already exists for this user.
    /// Transitions to UNLOCKED on success.
    pub async fn create_master_password(&mut self, master_password: &str) -> VaultResult<()> {
        if self.has_master_password().await? {
            return Err(VaultError::MasterPasswordExists);
        }

        let key = kdf::derive_key(master_password, KDF_SALT, self.config.kdf_iterations);
        let token = kdf::verification_token(&key);
        self.tokens.put_token(self.user_id(), &token).await?;

        self.hold_key(key);
        info!(user = self.user_id(), "master password created, vault unlocked");
        Ok(())
    }

    /// Unlock with the master password
    ///
    /// A missing verification record and a wrong password are deliberately
    /// indistinguishable to the caller: both are `InvalidPassword`.
    pub async fn unlock(&mut self, master_password: &str) -> VaultResult<()> {
        let key = kdf::derive_key(master_password, KDF_SALT, self.config.kdf_iterations);

        let verified = match self.tokens.get_token(self.user_id()).await? {
            Some(stored) => kdf::verify(&key, &stored),
            None => false,
        };

        if !verified {
            warn!(user = self.user_id(), "unlock failed");
            return Err(VaultError::InvalidPassword);
        }

        self.hold_key(key);
        info!(user = self.user_id(), "vault unlocked");
        Ok(())
    }

    /// Discard the held key and return to LOCKED
    pub fn lock(&mut self) {
        // Dropping the RawKey zeroizes it via secrecy.
        self.key = None;
        self.session_store.clear();
        debug!(user = self.user_id(), "vault locked");
    }

    /// Lock, then terminate the identity session
    pub async fn logout(&mut self) -> VaultResult<()> {
        self.lock();
        self.identity.logout().await
    }

    /// List all credentials (insertion order)
    pub async fn list(&self) -> VaultResult<CredentialCollection> {
        self.load_collection().await
    }

    /// Fetch a single credential by id
    pub async fn get(&self, id: &Uuid) -> VaultResult<Credential> {
        self.load_collection()
            .await?
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))
    }

    /// Case-insensitive search over title, username and url
    pub async fn search(&self, term: &str) -> VaultResult<Vec<Credential>> {
        Ok(self
            .load_collection()
            .await?
            .search(term)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Add a credential and persist the re-encrypted collection
    pub async fn add(&mut self, credential: Credential) -> VaultResult<()> {
        let mut collection = self.load_collection().await?;
        debug!(user = self.user_id(), credential = %credential.id, "adding credential");
        collection.add(credential);
        self.save_collection(&collection).await
    }

    /// Apply a partial update to a credential and persist
    pub async fn update(&mut self, id: &Uuid, update: CredentialUpdate) -> VaultResult<Credential> {
        let mut collection = self.load_collection().await?;
        let updated = collection
            .update(id, update)
            .cloned()
            .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))?;
        self.save_collection(&collection).await?;
        Ok(updated)
    }

    /// Remove a credential and persist
    pub async fn remove(&mut self, id: &Uuid) -> VaultResult<()> {
        let mut collection = self.load_collection().await?;
        if !collection.remove(id) {
            return Err(VaultError::CredentialNotFound(id.to_string()));
        }
        self.save_collection(&collection).await
    }

    fn hold_key(&mut self, key: RawKey) {
        self.session_store.put_key(key.to_base64());
        self.key = Some(key);
    }

    fn require_key(&self) -> VaultResult<&RawKey> {
        self.key.as_ref().ok_or(VaultError::VaultLocked)
    }

    async fn load_collection(&self) -> VaultResult<CredentialCollection> {
        let key = self.require_key()?;
        match self.blobs.load_blob(self.user_id()).await? {
            Some(blob) => {
                let plaintext = cipher::open(&blob, key)?;
                Ok(serde_json::from_slice(&plaintext)?)
            }
            // First use after setup: nothing stored yet.
            None => Ok(CredentialCollection::new()),
        }
    }

    async fn save_collection(&self, collection: &CredentialCollection) -> VaultResult<()> {
        let key = self.require_key()?;
        let plaintext = serde_json::to_vec(collection)?;
        let blob = cipher::seal(&plaintext, key)?;
        self.blobs.store_blob(self.user_id(), &blob).await
    }
}
