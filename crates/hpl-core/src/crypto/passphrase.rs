//! Rules for passphrases handed to the engine.
//!
//! Export refuses to seal a body under a blank passphrase. A passphrase a
//! user is choosing must also be at least [`MIN_PASSPHRASE_LENGTH`]
//! characters. Import applies neither rule: a passphrase that breaks them
//! simply fails to authenticate.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{HplError, Result};

/// Minimum length, in characters, of a newly chosen passphrase.
pub const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Whether `passphrase` may seal a document body.
pub(crate) fn ensure_sealable(passphrase: &SecretString) -> Result<()> {
    if passphrase.expose_secret().trim().is_empty() {
        return Err(HplError::InvalidInput(
            "refusing to encrypt with a blank passphrase".to_string(),
        ));
    }
    Ok(())
}

/// Check a passphrase the user is about to set.
///
/// # Examples
///
/// ```
/// use hpl_core::crypto::validate_passphrase;
/// use secrecy::SecretString;
///
/// assert!(validate_passphrase(&SecretString::from("correct horse battery".to_string())).is_ok());
/// assert!(validate_passphrase(&SecretString::from("short".to_string())).is_err());
/// ```
pub fn validate_passphrase(passphrase: &SecretString) -> Result<()> {
    ensure_sealable(passphrase)?;
    let length = passphrase.expose_secret().chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(HplError::InvalidInput(format!(
            "new passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(text: &str) -> SecretString {
        SecretString::from(text.to_string())
    }

    #[test]
    fn test_blank_never_seals() {
        for blank in ["", "   ", "\n\t"] {
            assert!(ensure_sealable(&secret(blank)).is_err());
            assert!(validate_passphrase(&secret(blank)).is_err());
        }
    }

    #[test]
    fn test_short_passphrase_still_seals() {
        // Existing documents may carry passphrases from before the length rule.
        assert!(ensure_sealable(&secret("abc")).is_ok());

        let err = validate_passphrase(&secret("abc")).unwrap_err();
        assert!(matches!(err, HplError::InvalidInput(_)));
        assert!(err.to_string().contains("at least 8 characters (got 3)"));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(validate_passphrase(&secret("ぱすわーどです!")).is_ok());
        assert!(validate_passphrase(&secret("ぱすわーどです")).is_err());
    }
}
