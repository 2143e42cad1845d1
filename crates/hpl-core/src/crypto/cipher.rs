//! AES-256-GCM sealing of document payloads.
//!
//! Every call to [`encrypt`] draws a fresh salt and a fresh nonce, so a
//! (key, nonce) pair is never reused. The associated data binds the
//! ciphertext to the document it was produced for.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::key::{derive_key, KdfParams};
use crate::error::{HplError, Result};

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// AES-GCM nonce (IV) length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// Authentication tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// Output of [`encrypt`]. Neither `iv` nor `salt` is secret, but both are
/// needed to decrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
    pub iv: [u8; NONCE_LENGTH],
    pub salt: [u8; SALT_LENGTH],
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
///
/// # Errors
///
/// Returns `HplError::InvalidInput` for an empty passphrase and
/// `HplError::Crypto` if the system RNG or the cipher fails.
pub fn encrypt(plaintext: &[u8], passphrase: &[u8], aad: &[u8], params: &KdfParams) -> Result<Sealed> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| HplError::Crypto(format!("Failed to generate salt: {}", e)))?;
    let mut iv = [0u8; NONCE_LENGTH];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| HplError::Crypto(format!("Failed to generate nonce: {}", e)))?;

    let key = derive_key(passphrase, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| HplError::Crypto("Invalid key length".to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), Payload { msg: plaintext, aad })
        .map_err(|_| HplError::Crypto("AEAD encryption failed".to_string()))?;

    Ok(Sealed {
        ciphertext,
        iv,
        salt,
    })
}

/// Decrypt and verify a payload produced by [`encrypt`].
///
/// Fails closed: any malformed input, wrong passphrase, altered ciphertext
/// or mismatched associated data yields `HplError::Authentication` and no
/// partial plaintext.
pub fn decrypt(
    ciphertext: &[u8],
    iv: &[u8],
    salt: &[u8],
    passphrase: &[u8],
    aad: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>> {
    if iv.len() != NONCE_LENGTH || ciphertext.len() < TAG_LENGTH {
        return Err(HplError::Authentication);
    }

    let key = derive_key(passphrase, salt, params).map_err(|_| HplError::Authentication)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| HplError::Authentication)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg: ciphertext, aad })
        .map_err(|_| HplError::Authentication)?;

    Ok(Zeroizing::new(plaintext))
}
