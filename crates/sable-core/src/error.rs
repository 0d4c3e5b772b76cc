//! Error types for vault operations

use thiserror::Error;

/// Errors that can occur during vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Vault is locked - unlock with master password first")]
    VaultLocked,

    #[error("Invalid master password")]
    InvalidPassword,

    #[error("A master password has already been created for this user")]
    MasterPasswordExists,

    #[error("Vault data unreadable - wrong key or corrupted storage")]
    VaultCorrupted,

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;
