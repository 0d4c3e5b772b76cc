//! Sable Core - zero-knowledge credential vault
//!
//! This crate provides:
//! - PBKDF2 master-key derivation with one-way verification tokens
//! - AES-256-GCM authenticated encryption of the credential collection
//! - A LOCKED/UNLOCKED session key lifecycle gating all vault access
//! - Policy-driven secure password generation
//! - Heuristic password-strength estimation
//!
//! The master password and the derived raw key never cross any of the
//! collaborator seams in [`store`]; only the non-reversible verification
//! token and the opaque encrypted blob do.

pub mod cipher;
pub mod error;
pub mod generator;
pub mod kdf;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod strength;

pub use cipher::{open, seal};
pub use error::{VaultError, VaultResult};
pub use generator::{generate, generate_with, PasswordPolicy};
pub use kdf::{derive_key, verification_token, verify, RawKey, VerificationToken};
pub use models::{Credential, CredentialCollection, CredentialUpdate, VaultBlob, VaultConfig};
pub use session::VaultSession;
pub use storage::{default_vault_dir, load_config, save_config, FileBlobStore, FileTokenStore};
pub use store::{
    BlobStore, IdentityProvider, LocalIdentity, MemoryBlobStore, MemorySessionStore,
    MemoryTokenStore, SessionStore, TokenStore,
};
pub use strength::{score, StrengthReport};
