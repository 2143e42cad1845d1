//! Sidecar file holding the iv and salt of an encrypted document.
//!
//! The document markup never embeds them, so they live in
//! `<document>.keys.json` next to it. Neither value is secret.
//!
//! A save stages the new parameters in `<document>.keys.json.new` before the
//! document is written and promotes them afterwards. If a save stops between
//! the two, the staged file is the one that matches the document on disk.

use std::io;
use std::path::{Path, PathBuf};

use hpl_core::CipherParams;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFile {
    pub file_id: String,
    #[serde(flatten)]
    pub params: CipherParams,
}

/// Which sidecar a set of parameters came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Committed,
    Staged,
}

/// Every sidecar found next to a document.
#[derive(Debug, Default)]
pub struct KeyFiles {
    pub committed: Option<KeyFile>,
    pub staged: Option<KeyFile>,
}

impl KeyFiles {
    /// Read both sidecars. A staged file that cannot be read is skipped.
    pub fn read(document: &Path) -> anyhow::Result<Self> {
        let committed = read_at(&keyfile_path(document))?;
        let staged = match read_at(&staged_keyfile_path(document)) {
            Ok(staged) => staged,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable staged key file");
                None
            }
        };
        Ok(Self { committed, staged })
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_none() && self.staged.is_none()
    }

    /// Parameters in the order to try them: committed first.
    pub fn candidates(&self) -> impl Iterator<Item = (KeySource, &KeyFile)> {
        self.committed
            .iter()
            .map(|k| (KeySource::Committed, k))
            .chain(self.staged.iter().map(|k| (KeySource::Staged, k)))
    }
}

pub fn keyfile_path(document: &Path) -> PathBuf {
    let mut name = document
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".keys.json");
    document.with_file_name(name)
}

pub fn staged_keyfile_path(document: &Path) -> PathBuf {
    let mut path = keyfile_path(document).into_os_string();
    path.push(".new");
    PathBuf::from(path)
}

/// Returns `None` when no sidecar exists at `path`.
fn read_at(path: &Path) -> anyhow::Result<Option<KeyFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Failed to read key file {}: {}",
                path.display(),
                e
            ))
        }
    };
    let keyfile = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse key file {}: {}", path.display(), e))?;
    Ok(Some(keyfile))
}

/// Write the parameters of a document that is about to be saved.
pub fn stage_keyfile(document: &Path, keyfile: &KeyFile) -> anyhow::Result<()> {
    let path = staged_keyfile_path(document);
    let contents = serde_json::to_vec_pretty(keyfile)?;
    hpl_core::fs::write_atomic(&path, &contents)
        .map_err(|e| anyhow::anyhow!("Failed to write key file {}: {}", path.display(), e))
}

/// Promote the staged parameters once their document is on disk.
pub fn commit_keyfile(document: &Path) -> anyhow::Result<()> {
    let staged = staged_keyfile_path(document);
    let path = keyfile_path(document);
    hpl_core::fs::replace_file(&staged, &path).map_err(|e| {
        anyhow::anyhow!(
            "Document saved, but its key file {} could not be updated ({}); \
             the new parameters remain in {}",
            path.display(),
            e,
            staged.display()
        )
    })
}

/// Drop staged parameters whose document was never written. Best effort.
pub fn discard_staged_keyfile(document: &Path) {
    let staged = staged_keyfile_path(document);
    if let Err(err) = remove_if_exists(&staged) {
        warn!(error = %err, "could not remove stale staged key file");
    }
}

/// Remove both sidecars, for a document saved without encryption.
pub fn remove_keyfile(document: &Path) -> anyhow::Result<()> {
    remove_if_exists(&keyfile_path(document))?;
    remove_if_exists(&staged_keyfile_path(document))
}

fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to remove key file {}: {}",
            path.display(),
            e
        )),
    }
}
