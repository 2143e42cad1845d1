//! Error types for HPL core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages. No variant ever carries passphrase or key
//! material.

use std::fmt;

use thiserror::Error;

/// Result type alias for HPL operations.
pub type Result<T> = std::result::Result<T, HplError>;

/// Core error type for HPL operations.
#[derive(Debug, Error)]
pub enum HplError {
    /// Malformed markup or document structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation error (missing required field, unknown column key, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Encrypted document imported without passphrase, iv and salt
    #[error("Missing credentials: passphrase, iv and salt are required for an encrypted document")]
    MissingCredentials,

    /// Decryption or integrity check failed
    #[error("Failed to decrypt: wrong passphrase or corrupted file")]
    Authentication,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Encryption-side failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Pipeline stage, used to give lower-level errors context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseDocument,
    ReadDocument,
    DecryptBody,
    BuildBody,
    EncryptBody,
    BuildDocument,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParseDocument => "parse document",
            Stage::ReadDocument => "read document",
            Stage::DecryptBody => "decrypt body",
            Stage::BuildBody => "build body",
            Stage::EncryptBody => "encrypt body",
            Stage::BuildDocument => "build document",
        };
        f.write_str(name)
    }
}

impl HplError {
    /// Prefix the message with the stage that failed.
    ///
    /// `Authentication` and `MissingCredentials` pass through unchanged so
    /// callers cannot tell a wrong passphrase from a corrupted payload.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            HplError::Parse(msg) => HplError::Parse(format!("{}: {}", stage, msg)),
            HplError::Validation(msg) => HplError::Validation(format!("{}: {}", stage, msg)),
            HplError::NotFound(msg) => HplError::NotFound(format!("{}: {}", stage, msg)),
            HplError::Crypto(msg) => HplError::Crypto(format!("{}: {}", stage, msg)),
            HplError::InvalidInput(msg) => HplError::InvalidInput(format!("{}: {}", stage, msg)),
            HplError::Storage(msg) => HplError::Storage(format!("{}: {}", stage, msg)),
            other @ (HplError::MissingCredentials | HplError::Authentication) => other,
        }
    }
}

impl From<std::io::Error> for HplError {
    fn from(err: std::io::Error) -> Self {
        HplError::Storage(err.to_string())
    }
}
