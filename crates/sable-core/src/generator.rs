//! Policy-driven password generation
//!
//! Builds a character set from the enabled classes and maps
//! cryptographically secure random bytes onto it. The random source is a
//! caller-supplied capability so tests can substitute a seeded generator;
//! production callers use [`generate`], which draws from the OS CSPRNG.

use rand::{rngs::OsRng, CryptoRng, RngCore};

use crate::error::{VaultError, VaultResult};

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPERCASE_UNAMBIGUOUS: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const LOWERCASE_UNAMBIGUOUS: &str = "abcdefghjkmnpqrstuvwxyz";
const DIGITS: &str = "0123456789";
const DIGITS_UNAMBIGUOUS: &str = "23456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Character-class policy for a single generation call
///
/// A configuration value; not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub length: usize,
    pub include_uppercase: bool,
    pub include_lowercase: bool,
    pub include_numbers: bool,
    pub include_symbols: bool,
    /// Drop visually similar characters (0/O, 1/l/I, ...)
    pub exclude_similar: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            include_uppercase: true,
            include_lowercase: true,
            include_numbers: true,
            include_symbols: true,
            exclude_similar: false,
        }
    }
}

impl PasswordPolicy {
    /// Assemble the effective character set for this policy
    fn charset(&self) -> String {
        let mut charset = String::new();
        if self.include_uppercase {
            charset.push_str(if self.exclude_similar {
                UPPERCASE_UNAMBIGUOUS
            } else {
                UPPERCASE
            });
        }
        if self.include_lowercase {
            charset.push_str(if self.exclude_similar {
                LOWERCASE_UNAMBIGUOUS
            } else {
                LOWERCASE
            });
        }
        if self.include_numbers {
            charset.push_str(if self.exclude_similar {
                DIGITS_UNAMBIGUOUS
            } else {
                DIGITS
            });
        }
        if self.include_symbols {
            charset.push_str(SYMBOLS);
        }
        charset
    }
}

/// Generate a password from the OS CSPRNG
pub fn generate(policy: &PasswordPolicy) -> VaultResult<String> {
    generate_with(policy, &mut OsRng)
}

/// Generate a password from a caller-supplied secure random source
///
/// Rejected before any randomness is drawn if no character class is
/// enabled. Each output character is `charset[byte % charset.len()]`;
/// the modulo introduces a mild bias when the charset length does not
/// divide 256. TODO: switch to rejection sampling to remove the bias.
pub fn generate_with<R: RngCore + CryptoRng>(
    policy: &PasswordPolicy,
    rng: &mut R,
) -> VaultResult<String> {
    let charset = policy.charset();
    if charset.is_empty() {
        return Err(VaultError::Config(
            "at least one character class must be selected".to_string(),
        ));
    }

    let chars = charset.as_bytes();
    let mut random = vec![0u8; policy.length];
    rng.fill_bytes(&mut random);

    Ok(random
        .iter()
        .map(|&byte| chars[byte as usize % chars.len()] as char)
        .collect())
}
