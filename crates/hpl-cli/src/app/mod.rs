//! Application-level utilities for the HPL CLI.
//!
//! This module provides:
//! - Path resolution for config and document files
//! - Passphrase handling with retry logic
//! - Loading and saving a document together with its key file

mod context;
mod document;
mod passphrase;
mod resolver;

pub use context::AppContext;
pub use document::{save_document, OpenDocument};
pub use resolver::{missing_document_message, resolve_config_path};
