//! # HPL Core
//!
//! Core library for Hashed Potato Lite - a local, passphrase-protected store
//! for categorized credential records.
//!
//! This crate provides the document engine independent of any front end.
//!
//! ## Architecture
//!
//! - **markup**: XML text ⇄ `Value` tree codec with always-sequence path rules
//! - **crypto**: PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM sealing
//! - **document**: the credential file model and its mutable lenses
//! - **pipeline**: whole-document import/export through an explicit `Engine`
//! - **store**: byte-level persistence of exported documents

pub mod crypto;
pub mod document;
pub mod error;
pub mod fs;
pub mod markup;
pub mod pipeline;
pub mod store;

pub use document::{
    Account, AccountFields, AccountMut, Body, BodyMut, Document, FileVersion, Head, HeadMut,
    Options, OptionsMut, SequenceEntry, Table, TableMut,
};
pub use crypto::KdfParams;
pub use markup::CodecConfig;
pub use error::{HplError, Result};
pub use pipeline::{CipherParams, Engine, EngineConfig, Exported};
pub use store::{DocumentStore, FileStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
