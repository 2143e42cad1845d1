//! Cryptographic operations for HPL.
//!
//! - **PBKDF2-HMAC-SHA256** derives a 256-bit key from the passphrase and a
//!   random 16-byte salt
//! - **AES-256-GCM** seals the document body with a random 12-byte nonce and
//!   a 128-bit authentication tag, binding the document's `file_id` as
//!   associated data
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the credential file
//! - Offline brute-force attacks on the passphrase
//! - Swapping an encrypted body into a different document
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory

pub mod cipher;
pub mod key;
pub mod passphrase;

pub use cipher::{decrypt, encrypt, Sealed, NONCE_LENGTH, SALT_LENGTH, TAG_LENGTH};
pub use key::{
    derive_key, DerivedKey, KdfParams, DEFAULT_PBKDF2_ITERATIONS, KEY_LENGTH,
    MAX_PBKDF2_ITERATIONS, MIN_PBKDF2_ITERATIONS,
};
pub(crate) use passphrase::ensure_sealable;
pub use passphrase::{validate_passphrase, MIN_PASSPHRASE_LENGTH};
