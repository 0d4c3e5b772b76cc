//! Data models for credentials and vault configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kdf::DEFAULT_KDF_ITERATIONS;

/// A single stored login credential
///
/// Only ever materialized in decrypted form, in memory, while the session
/// holds the raw key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable title (e.g., "GitHub")
    pub title: String,

    /// Login username or email
    pub username: String,

    /// The secret itself
    pub password: String,

    /// Optional site URL
    pub url: Option<String>,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// When the credential was created
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a new credential with a fresh id and timestamps
    pub fn new(
        title: String,
        username: String,
        password: String,
        url: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            username,
            password,
            url,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to an existing credential
///
/// `None` fields are left untouched; `updated_at` is bumped on apply.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

/// The decrypted credential collection (in-memory only, never persisted)
///
/// Insertion-ordered; ids are unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialCollection {
    pub credentials: Vec<Credential>,
}

impl CredentialCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Find a credential by id
    pub fn find_by_id(&self, id: &Uuid) -> Option<&Credential> {
        self.credentials.iter().find(|c| &c.id == id)
    }

    /// Append a credential, preserving insertion order
    pub fn add(&mut self, credential: Credential) {
        self.credentials.push(credential);
    }

    /// Apply a partial update to the credential with the given id
    ///
    /// Returns the updated credential, or None if the id is unknown.
    pub fn update(&mut self, id: &Uuid, update: CredentialUpdate) -> Option<&Credential> {
        let credential = self.credentials.iter_mut().find(|c| &c.id == id)?;

        if let Some(title) = update.title {
            credential.title = title;
        }
        if let Some(username) = update.username {
            credential.username = username;
        }
        if let Some(password) = update.password {
            credential.password = password;
        }
        if let Some(url) = update.url {
            credential.url = url;
        }
        if let Some(notes) = update.notes {
            credential.notes = notes;
        }
        credential.updated_at = Utc::now();

        Some(credential)
    }

    /// Remove a credential by id; returns true if one was removed
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.credentials.len();
        self.credentials.retain(|c| &c.id != id);
        self.credentials.len() < before
    }

    /// Case-insensitive search over title, username and url
    pub fn search(&self, term: &str) -> Vec<&Credential> {
        let term = term.to_lowercase();
        self.credentials
            .iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&term)
                    || c.username.to_lowercase().contains(&term)
                    || c.url
                        .as_deref()
                        .is_some_and(|u| u.to_lowercase().contains(&term))
            })
            .collect()
    }
}

/// The encrypted, authenticated serialization of a credential collection
///
/// base64(nonce ‖ ciphertext‖tag); opaque without the raw key. Any tamper
/// invalidates the authentication tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultBlob(String);

impl VaultBlob {
    pub fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Vault configuration (non-sensitive, stored in plaintext TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// PBKDF2 iteration count; tunable upward as hardware improves
    pub kdf_iterations: u32,
}

impl VaultConfig {
    /// Floor for the iteration count; configs below it are clamped
    pub const MIN_KDF_ITERATIONS: u32 = DEFAULT_KDF_ITERATIONS;
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, username: &str, url: Option<&str>) -> Credential {
        Credential::new(
            title.to_string(),
            username.to_string(),
            "pw".to_string(),
            url.map(String::from),
            None,
        )
    }

    #[test]
    fn test_add_and_find() {
        let mut collection = CredentialCollection::new();
        let credential = sample("GitHub", "octocat", None);
        let id = credential.id;
        collection.add(credential);

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.find_by_id(&id).unwrap().title, "GitHub");
    }

    #[test]
    fn test_update_bumps_timestamp() {
        let mut collection = CredentialCollection::new();
        let credential = sample("GitHub", "octocat", None);
        let id = credential.id;
        let created = credential.created_at;
        collection.add(credential);

        let updated = collection
            .update(
                &id,
                CredentialUpdate {
                    password: Some("new-pw".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.password, "new-pw");
        assert_eq!(updated.title, "GitHub");
        assert!(updated.updated_at >= created);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut collection = CredentialCollection::new();
        assert!(collection
            .update(&Uuid::new_v4(), CredentialUpdate::default())
            .is_none());
    }

    #[test]
    fn test_remove() {
        let mut collection = CredentialCollection::new();
        let credential = sample("GitHub", "octocat", None);
        let id = credential.id;
        collection.add(credential);

        assert!(collection.remove(&id));
        assert!(!collection.remove(&id));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_search_matches_title_username_url() {
        let mut collection = CredentialCollection::new();
        collection.add(sample("GitHub", "octocat", Some("https://github.com")));
        collection.add(sample("Mail", "cat@example.com", None));
        collection.add(sample("Bank", "alice", Some("https://bank.example")));

        assert_eq!(collection.search("github").len(), 1);
        assert_eq!(collection.search("CAT").len(), 2);
        assert_eq!(collection.search("example").len(), 2);
        assert!(collection.search("missing").is_empty());
    }

    #[test]
    fn test_collection_serialization_roundtrip() {
        let mut collection = CredentialCollection::new();
        collection.add(sample("GitHub", "octocat", Some("https://github.com")));

        let bytes = serde_json::to_vec(&collection).unwrap();
        let restored: CredentialCollection = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(restored.credentials, collection.credentials);
    }
}
