//! Small session file remembering the last used document.
//!
//! Never holds the passphrase, only whether the document asked for one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::xdg_data_dir;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub last_file: Option<String>,
    #[serde(default)]
    pub needs_passphrase: bool,
}

impl Session {
    pub fn last_file(&self) -> Option<PathBuf> {
        self.last_file
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

pub fn session_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("session.json"))
}

/// Read the session, treating a missing or unreadable file as empty.
pub fn read_session(path: &Path) -> Session {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str(&contents).ok())
        .unwrap_or_default()
}

pub fn write_session(path: &Path, session: &Session) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_vec_pretty(session)?;
    hpl_core::fs::write_atomic(path, &contents)
        .map_err(|e| anyhow::anyhow!("Failed to write session {}: {}", path.display(), e))
}

/// Record `document` as the last used file. Failures are logged, not fatal.
pub fn remember(document: &Path, needs_passphrase: bool) {
    let session = Session {
        last_file: Some(document.to_string_lossy().to_string()),
        needs_passphrase,
    };
    let result = session_path().and_then(|path| write_session(&path, &session));
    if let Err(err) = result {
        tracing::warn!(error = %err, "could not update session file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session {
            last_file: Some("/tmp/accounts.hpl.xml".to_string()),
            needs_passphrase: true,
        };

        write_session(&path, &session).unwrap();
        assert_eq!(read_session(&path), session);
        assert_eq!(
            read_session(&path).last_file(),
            Some(PathBuf::from("/tmp/accounts.hpl.xml"))
        );
    }

    #[test]
    fn test_missing_or_corrupt_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        assert_eq!(read_session(&path), Session::default());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_session(&path).last_file(), None);
    }
}
