//! Filesystem utilities for atomic document writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `destination` without ever exposing a half-written file.
///
/// The data goes to a hidden sibling first, is flushed to disk, and is then
/// moved over the destination with [`replace_file`]. On failure the
/// destination keeps its previous contents.
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = hidden_sibling(destination, "tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        if let Err(err) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
    }
    replace_file(&temp_path, destination)
}

/// Move `source` over the regular file (or empty slot) at `destination`.
///
/// Where a plain rename cannot replace an existing file, the old file is
/// parked next to the destination and put back if the second rename fails.
/// `source` is removed whenever the move does not happen. Directories are
/// never replaced.
pub fn replace_file(source: &Path, destination: &Path) -> io::Result<()> {
    let initial_err = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if !destination.is_file() || !source.exists() {
        let _ = fs::remove_file(source);
        return Err(initial_err);
    }

    let parked = hidden_sibling(destination, "old");
    if let Err(park_err) = fs::rename(destination, &parked) {
        let _ = fs::remove_file(source);
        return Err(io::Error::new(
            park_err.kind(),
            format!(
                "Could not replace {} (rename: {}, moving old file aside: {})",
                destination.display(),
                initial_err,
                park_err
            ),
        ));
    }

    match fs::rename(source, destination) {
        Ok(()) => {
            let _ = fs::remove_file(&parked);
            Ok(())
        }
        Err(retry_err) => {
            let restored = fs::rename(&parked, destination);
            let _ = fs::remove_file(source);
            let note = match restored {
                Ok(()) => "previous file restored".to_string(),
                Err(e) => format!("previous file left at {}: {}", parked.display(), e),
            };
            Err(io::Error::new(
                retry_err.kind(),
                format!(
                    "Could not replace {} (rename: {}, retry: {}; {})",
                    destination.display(),
                    initial_err,
                    retry_err,
                    note
                ),
            ))
        }
    }
}

fn hidden_sibling(destination: &Path, suffix: &str) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    destination.with_file_name(format!(".{}.{}.{}", name, std::process::id(), suffix))
}
