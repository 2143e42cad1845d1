//! A loaded document plus what is needed to write it back.

use std::path::{Path, PathBuf};

use hpl_core::{Document, DocumentStore, Engine, FileStore};
use secrecy::SecretString;
use tracing::debug;

use crate::keyfile::{commit_keyfile, discard_staged_keyfile, remove_keyfile, stage_keyfile, KeyFile};
use crate::session;

pub struct OpenDocument {
    path: PathBuf,
    store: FileStore,
    pub document: Document,
    /// Passphrase the document was opened with. `None` saves it unencrypted.
    pub passphrase: Option<SecretString>,
}

impl OpenDocument {
    pub fn new(path: PathBuf, document: Document, passphrase: Option<SecretString>) -> Self {
        let store = FileStore::new(&path);
        Self {
            path,
            store,
            document,
            passphrase,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Export the document and write it together with its key file.
///
/// An encrypted save stages the new key file, writes the document and then
/// promotes the staged key file; a plain save removes both key files.
pub fn save_document(engine: &Engine, open: &mut OpenDocument) -> anyhow::Result<()> {
    let exported = engine.export(&mut open.document, open.passphrase.as_ref())?;

    match exported.params {
        Some(params) => {
            stage_keyfile(
                &open.path,
                &KeyFile {
                    file_id: open.document.file_id().to_string(),
                    params,
                },
            )?;
            if let Err(err) = open.store.save(exported.markup.as_bytes()) {
                discard_staged_keyfile(&open.path);
                return Err(err.into());
            }
            commit_keyfile(&open.path)?;
        }
        None => {
            open.store.save(exported.markup.as_bytes())?;
            remove_keyfile(&open.path)?;
        }
    }

    debug!(
        path = %open.path.display(),
        version = %open.document.head().file_version(),
        encrypted = open.passphrase.is_some(),
        "saved document"
    );
    session::remember(&open.path, open.passphrase.is_some());
    Ok(())
}
