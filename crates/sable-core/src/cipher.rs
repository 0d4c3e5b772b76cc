//! Authenticated encryption of the credential collection
//!
//! AES-256-GCM under the raw key. Every call to [`seal`] draws a fresh
//! random nonce; nonce reuse under one key would be a full
//! confidentiality break, so nonces are never cached or derived.
//!
//! The stored representation is base64(nonce ‖ ciphertext‖tag). Any
//! failure on the way back out - bad base64, short input, tag mismatch -
//! collapses to [`VaultError::VaultCorrupted`]: the caller learns only
//! that the vault data is unreadable, and never sees unauthenticated
//! plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;

use crate::error::{VaultError, VaultResult};
use crate::kdf::RawKey;
use crate::models::VaultBlob;

/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Encrypt plaintext bytes into a vault blob
pub fn seal(plaintext: &[u8], key: &RawKey) -> VaultResult<VaultBlob> {
    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|_| VaultError::Config("invalid key length".to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VaultError::VaultCorrupted)?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(VaultBlob::from_encoded(BASE64.encode(combined)))
}

/// Decrypt a vault blob back to plaintext bytes
///
/// Fails closed: wrong key, corrupted or truncated data all surface as
/// [`VaultError::VaultCorrupted`].
pub fn open(blob: &VaultBlob, key: &RawKey) -> VaultResult<Vec<u8>> {
    let combined = BASE64
        .decode(blob.as_str())
        .map_err(|_| VaultError::VaultCorrupted)?;

    if combined.len() < NONCE_SIZE {
        return Err(VaultError::VaultCorrupted);
    }
    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|_| VaultError::Config("invalid key length".to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| VaultError::VaultCorrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{derive_key, KDF_SALT};

    fn test_key(password: &str) -> RawKey {
        derive_key(password, KDF_SALT, 1_000)
    }

    #[test]
    fn test_roundtrip() {
        let key = test_key("test-password");
        let plaintext = b"[{\"title\":\"GitHub\"}]";

        let blob = seal(plaintext, &key).unwrap();
        let decrypted = open(&blob, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_roundtrip_empty_plaintext() {
        let key = test_key("test-password");
        let blob = seal(b"", &key).unwrap();
        assert_eq!(open(&blob, &key).unwrap(), b"");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let key = test_key("test-password");
        let plaintext = b"same plaintext";

        let first = seal(plaintext, &key).unwrap();
        let second = seal(plaintext, &key).unwrap();

        // Distinct nonces mean distinct blobs, but both decrypt back.
        assert_ne!(first, second);
        assert_eq!(open(&first, &key).unwrap(), plaintext);
        assert_eq!(open(&second, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let blob = seal(b"secret", &test_key("password-one")).unwrap();
        let result = open(&blob, &test_key("password-two"));
        assert!(matches!(result, Err(VaultError::VaultCorrupted)));
    }

    #[test]
    fn test_tamper_detection_every_byte() {
        let key = test_key("test-password");
        let blob = seal(b"tamper target", &key).unwrap();
        let combined = BASE64.decode(blob.as_str()).unwrap();

        for i in 0..combined.len() {
            let mut tampered = combined.clone();
            tampered[i] ^= 0x01;
            let tampered = VaultBlob::from_encoded(BASE64.encode(&tampered));
            assert!(
                matches!(open(&tampered, &key), Err(VaultError::VaultCorrupted)),
                "bit flip at byte {i} was not detected"
            );
        }
    }

    #[test]
    fn test_garbage_blob_fails_closed() {
        let key = test_key("test-password");

        let not_base64 = VaultBlob::from_encoded("!!not-base64!!".to_string());
        assert!(matches!(open(&not_base64, &key), Err(VaultError::VaultCorrupted)));

        let too_short = VaultBlob::from_encoded(BASE64.encode([0u8; 4]));
        assert!(matches!(open(&too_short, &key), Err(VaultError::VaultCorrupted)));
    }
}
