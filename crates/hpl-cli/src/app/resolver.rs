//! Path resolution for config and document files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, HplConfig};
use crate::session::{read_session, session_path};

/// Resolve the config file path, checking HPL_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("HPL_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the document path: `--file`, then config, then the last session.
pub fn resolve_document_path(cli: &Cli, config: &HplConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.file.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.document.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = read_session(&session_path()?).last_file() {
        return Ok(path);
    }
    Err(anyhow::anyhow!(
        "No document selected\n\nRun:\n  hpl init\n\nOr specify a document path:\n  HPL_FILE=/path/to/accounts.hpl.xml hpl info"
    ))
}

/// Error message when the document file is missing.
pub fn missing_document_message(path: &Path) -> String {
    format!(
        "No document found at {}\n\nRun:\n  hpl init {}",
        path.display(),
        path.display()
    )
}
