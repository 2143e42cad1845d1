//! Byte-level persistence of exported documents.
//!
//! The engine never touches the filesystem itself; front ends hand the
//! exported markup to a [`DocumentStore`] and read it back from one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HplError, Result};
use crate::fs::write_atomic;

/// "Give me bytes" / "take these bytes".
pub trait DocumentStore {
    /// Read the stored document.
    ///
    /// # Errors
    ///
    /// Returns `HplError::NotFound` if nothing has been stored yet and
    /// `HplError::Storage` for any other I/O failure.
    fn load(&self) -> Result<Vec<u8>>;

    /// Replace the stored document. A failed save leaves the previous
    /// contents in place.
    fn save(&self, bytes: &[u8]) -> Result<()>;

    /// Read the stored document as markup text.
    fn load_markup(&self) -> Result<String> {
        String::from_utf8(self.load()?)
            .map_err(|e| HplError::Parse(format!("document is not valid UTF-8: {}", e)))
    }
}

/// A document stored in a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "loaded document");
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(HplError::NotFound(format!(
                "Document file '{}'",
                self.path.display()
            ))),
            Err(e) => Err(HplError::Storage(format!(
                "Failed to read '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&self.path, bytes).map_err(|e| {
            HplError::Storage(format!("Failed to write '{}': {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }
}
