//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is a security parameter that only ever moves up:
//! values below [`MIN_PBKDF2_ITERATIONS`] are rejected outright, and the
//! pipeline never re-encrypts a document with fewer iterations than it was
//! last sealed with. The count is read from the unauthenticated head, so it
//! is also capped at [`MAX_PBKDF2_ITERATIONS`].

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::{HplError, Result};

/// Lowest accepted iteration count.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Highest accepted iteration count.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Iteration count for new documents, and the count assumed for encrypted
/// documents that predate the `kdf_iterations` head field.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256-GCM).
pub const KEY_LENGTH: usize = 32;

/// Minimum salt length in bytes.
pub const MIN_SALT_LENGTH: usize = 16;

/// Key derivation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Create parameters with the given iteration count.
    ///
    /// # Errors
    ///
    /// Returns `HplError::InvalidInput` if `iterations` is outside
    /// [`MIN_PBKDF2_ITERATIONS`]..=[`MAX_PBKDF2_ITERATIONS`].
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(HplError::InvalidInput(format!(
                "PBKDF2 iterations must be at least {} (got {})",
                MIN_PBKDF2_ITERATIONS, iterations
            )));
        }
        if iterations > MAX_PBKDF2_ITERATIONS {
            return Err(HplError::InvalidInput(format!(
                "PBKDF2 iterations must be at most {} (got {})",
                MAX_PBKDF2_ITERATIONS, iterations
            )));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// The stronger of `self` and a previously recorded count.
    pub(crate) fn at_least(self, recorded: Option<u32>) -> Self {
        match recorded {
            Some(previous) if previous > self.iterations => Self {
                iterations: previous,
            },
            _ => self,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// A cryptographic key derived from a passphrase.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate cipher operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a passphrase and salt.
///
/// # Security
///
/// - Same passphrase + salt + iterations always produces the same key
/// - The salt is not secret but must be fresh for every encryption
///
/// # Examples
///
/// ```
/// use hpl_core::crypto::{derive_key, KdfParams};
///
/// let salt = b"unique-salt-16by";
/// let key = derive_key(b"my-passphrase", salt, &KdfParams::default()).unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(HplError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    if salt.len() < MIN_SALT_LENGTH {
        return Err(HplError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            MIN_SALT_LENGTH
        )));
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase, salt, params.iterations, &mut key);
    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(MIN_PBKDF2_ITERATIONS).unwrap()
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let salt = b"unique-salt-1234567890123456";

        let key1 = derive_key(b"test-passphrase", salt, &fast()).unwrap();
        let key2 = derive_key(b"test-passphrase", salt, &fast()).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key(b"test-passphrase", b"salt1-1234567890123456", &fast()).unwrap();
        let key2 = derive_key(b"test-passphrase", b"salt2-1234567890123456", &fast()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_iterations_change_key() {
        let salt = b"fixed-salt-123456789012345";
        let key1 = derive_key(b"passphrase", salt, &fast()).unwrap();
        let key2 = derive_key(b"passphrase", salt, &KdfParams::new(100_001).unwrap()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = derive_key(b"", b"salt-1234567890123456", &fast());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Passphrase cannot be empty"));
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key(b"test-passphrase", b"short", &fast());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Salt must be at least 16 bytes"));
    }

    #[test]
    fn test_low_iteration_count_rejected() {
        assert!(KdfParams::new(99_999).is_err());
        assert!(KdfParams::new(MIN_PBKDF2_ITERATIONS).is_ok());
    }

    #[test]
    fn test_high_iteration_count_rejected() {
        assert_eq!(
            KdfParams::new(MAX_PBKDF2_ITERATIONS).unwrap().iterations(),
            MAX_PBKDF2_ITERATIONS
        );
        let err = KdfParams::new(MAX_PBKDF2_ITERATIONS + 1).unwrap_err();
        assert!(err.to_string().contains("at most 10000000"));
        assert!(KdfParams::new(u32::MAX).is_err());
    }

    #[test]
    fn test_at_least_never_lowers() {
        let params = fast();
        assert_eq!(params.at_least(Some(300_000)).iterations(), 300_000);
        assert_eq!(params.at_least(Some(1)).iterations(), MIN_PBKDF2_ITERATIONS);
        assert_eq!(params.at_least(None), params);
    }

    #[test]
    fn test_derived_key_debug_redacts() {
        let key = derive_key(b"test-passphrase", b"salt-1234567890123456", &fast()).unwrap();

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
