//! Passphrase handling and document opening with retry logic.

use std::path::PathBuf;

use hpl_core::{Document, DocumentStore, FileStore, HplError};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::helpers::{env_value, prompt_passphrase};
use crate::keyfile::{commit_keyfile, discard_staged_keyfile, keyfile_path, KeyFiles, KeySource};
use crate::session;

use super::context::AppContext;
use super::document::OpenDocument;
use super::resolver::missing_document_message;

const MAX_ATTEMPTS: u32 = 3;

/// Load the document at `path`.
///
/// Plain documents open directly. Encrypted ones need a key file and a
/// passphrase from HPL_PASSPHRASE or, when interactive, a prompt that is
/// retried on a wrong passphrase. A staged key file left by an interrupted
/// save is tried after the committed one and promoted when it matches.
pub fn open_document_with_retry(ctx: &AppContext<'_>, path: PathBuf) -> anyhow::Result<OpenDocument> {
    let store = FileStore::new(&path);
    let markup = match store.load_markup() {
        Ok(markup) => markup,
        Err(HplError::NotFound(_)) => {
            return Err(anyhow::anyhow!(missing_document_message(&path)))
        }
        Err(err) => return Err(err.into()),
    };

    let engine = ctx.engine();
    if !engine.is_encrypted_xml(&markup) {
        let document = engine.import(&markup, None, None)?;
        session::remember(&path, false);
        return Ok(OpenDocument::new(path, document, None));
    }

    let keys = KeyFiles::read(&path)?;
    if keys.is_empty() {
        return Err(anyhow::anyhow!(
            "Document {} is encrypted but its key file {} is missing",
            path.display(),
            keyfile_path(&path).display()
        ));
    }
    let file_id = engine.file_id_from_xml(&markup);
    for (source, keyfile) in keys.candidates() {
        if file_id.as_deref() != Some(keyfile.file_id.as_str()) {
            warn!(path = %path.display(), ?source, "key file was written for a different document");
        }
    }

    if let Some(value) = env_value("HPL_PASSPHRASE") {
        let passphrase = SecretString::from(value);
        let (document, source) = import_with_keys(ctx, &markup, &passphrase, &keys)?;
        return Ok(opened(path, document, passphrase, source, &keys));
    }

    let interactive = ctx.interactive();
    if !interactive {
        return Err(anyhow::anyhow!(
            "Document is encrypted and no TTY is available. Set HPL_PASSPHRASE."
        ));
    }

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let passphrase = prompt_passphrase(interactive)?;
        match import_with_keys(ctx, &markup, &passphrase, &keys) {
            Ok((document, source)) => return Ok(opened(path, document, passphrase, source, &keys)),
            Err(HplError::Authentication) if attempts < MAX_ATTEMPTS => {
                eprintln!("Incorrect passphrase. Try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Decrypt with the committed key file, falling back to a staged one left
/// by an interrupted save.
fn import_with_keys(
    ctx: &AppContext<'_>,
    markup: &str,
    passphrase: &SecretString,
    keys: &KeyFiles,
) -> Result<(Document, KeySource), HplError> {
    for (source, keyfile) in keys.candidates() {
        match ctx.engine().import(markup, Some(passphrase), Some(&keyfile.params)) {
            Ok(document) => return Ok((document, source)),
            Err(HplError::Authentication) => continue,
            Err(err) => return Err(err),
        }
    }
    Err(HplError::Authentication)
}

fn opened(
    path: PathBuf,
    document: Document,
    passphrase: SecretString,
    source: KeySource,
    keys: &KeyFiles,
) -> OpenDocument {
    match source {
        KeySource::Staged => match commit_keyfile(&path) {
            Ok(()) => info!(path = %path.display(), "recovered key file from an interrupted save"),
            Err(err) => warn!(error = %err, "could not promote staged key file"),
        },
        KeySource::Committed if keys.staged.is_some() => discard_staged_keyfile(&path),
        KeySource::Committed => {}
    }
    session::remember(&path, true);
    OpenDocument::new(path, document, Some(passphrase))
}
