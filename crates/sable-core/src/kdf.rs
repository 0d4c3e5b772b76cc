//! Master-key derivation and verification
//!
//! - PBKDF2-HMAC-SHA256 for password-based key derivation
//! - Domain-separated SHA-256 verification token
//! - Constant-time verification against the stored token
//!
//! Derivation is deterministic on purpose: the same master password must
//! reproduce the same raw key on any device, since only the (one-way)
//! verification token ever leaves the device.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};

/// Size of the derived symmetric key in bytes
pub const KEY_SIZE: usize = 32;

/// Application-wide derivation salt
///
/// The same password must derive the same key on every device; a
/// per-user random salt would break remote token verification.
pub const KDF_SALT: &[u8] = b"sable-vault-salt-v1";

/// Default PBKDF2 iteration count; tunable upward via `VaultConfig`
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Domain-separation context for the verification token
///
/// Distinct from `KDF_SALT` so the token digest and the key derivation
/// never share an input domain.
const VERIFY_CONTEXT: &[u8] = b"sable-vault-verify-v1";

/// The raw symmetric key derived from the master password
///
/// Held only in memory (or base64 in the ephemeral session store) and
/// zeroized on drop. Never persisted, never sent over a network boundary.
pub struct RawKey(Secret<[u8; KEY_SIZE]>);

impl RawKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Secret::new(bytes))
    }

    /// Expose the key bytes for cipher operations
    pub(crate) fn expose(&self) -> &[u8; KEY_SIZE] {
        self.0.expose_secret()
    }

    /// Encode for the ephemeral session store
    pub fn to_base64(&self) -> SecretString {
        SecretString::new(BASE64.encode(self.0.expose_secret()))
    }

    /// Rebuild a key from its session-store encoding
    pub fn from_base64(encoded: &SecretString) -> VaultResult<Self> {
        let mut decoded = BASE64
            .decode(encoded.expose_secret())
            .map_err(|_| VaultError::Storage("malformed session key".to_string()))?;

        if decoded.len() != KEY_SIZE {
            decoded.zeroize();
            return Err(VaultError::Storage("malformed session key".to_string()));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        Ok(Self::from_bytes(bytes))
    }
}

/// Non-reversible proof of knowledge of the master password
///
/// Safe to persist remotely; recovering the raw key from it would require
/// inverting SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the raw key from a master password
///
/// Deterministic: identical password + salt + iterations always yield the
/// identical key. Never fails for valid string input.
pub fn derive_key(master_password: &str, salt: &[u8], iterations: u32) -> RawKey {
    let mut output = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(master_password.as_bytes(), salt, iterations, &mut output);

    let key = RawKey::from_bytes(output);
    output.zeroize();
    key
}

/// Compute the verification token for a raw key
///
/// One-way transform with a context prefix; never the key's own encoding.
pub fn verification_token(key: &RawKey) -> VerificationToken {
    VerificationToken(BASE64.encode(token_digest(key)))
}

/// Check a candidate key against a stored verification token
///
/// Constant-time comparison over the digest bytes. Returns false (not an
/// error) on mismatch or on a malformed stored token: this signals "wrong
/// password", not a system fault.
pub fn verify(candidate: &RawKey, stored: &VerificationToken) -> bool {
    let expected = match BASE64.decode(stored.as_str()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let computed = token_digest(candidate);
    if expected.len() != computed.len() {
        return false;
    }

    computed.ct_eq(&expected).into()
}

fn token_digest(key: &RawKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(VERIFY_CONTEXT);
    hasher.update(key.expose());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    // Small iteration count keeps the tests fast; determinism does not
    // depend on the count.
    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_derivation_deterministic() {
        let a = derive_key("correct horse battery staple", KDF_SALT, TEST_ITERATIONS);
        let b = derive_key("correct horse battery staple", KDF_SALT, TEST_ITERATIONS);
        assert_eq!(a.expose(), b.expose());
    }

    #[test]
    fn test_derivation_differs_per_password() {
        let a = derive_key("password-one", KDF_SALT, TEST_ITERATIONS);
        let b = derive_key("password-two", KDF_SALT, TEST_ITERATIONS);
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn test_derivation_differs_per_iterations() {
        let a = derive_key("same password", KDF_SALT, TEST_ITERATIONS);
        let b = derive_key("same password", KDF_SALT, TEST_ITERATIONS + 1);
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn test_verification_soundness() {
        let key = derive_key("hunter2hunter2", KDF_SALT, TEST_ITERATIONS);
        let token = verification_token(&key);
        assert!(verify(&key, &token));

        let other = derive_key("hunter3hunter3", KDF_SALT, TEST_ITERATIONS);
        assert!(!verify(&other, &token));
    }

    #[test]
    fn test_token_is_not_the_key_encoding() {
        let key = derive_key("some master password", KDF_SALT, TEST_ITERATIONS);
        let token = verification_token(&key);
        assert_ne!(token.as_str(), key.to_base64().expose_secret());
    }

    #[test]
    fn test_verify_rejects_malformed_token() {
        let key = derive_key("whatever", KDF_SALT, TEST_ITERATIONS);
        assert!(!verify(&key, &VerificationToken::from_string("not base64!!!".into())));
        assert!(!verify(&key, &VerificationToken::from_string(String::new())));
    }

    #[test]
    fn test_session_encoding_roundtrip() {
        let key = derive_key("roundtrip", KDF_SALT, TEST_ITERATIONS);
        let restored = RawKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.expose(), restored.expose());
    }

    #[test]
    fn test_session_encoding_rejects_wrong_length() {
        let short = SecretString::new(BASE64.encode([0u8; 16]));
        assert!(RawKey::from_base64(&short).is_err());
    }
}
