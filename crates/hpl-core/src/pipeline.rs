//! Whole-document import and export.
//!
//! Import turns markup into a [`Document`], decrypting the body when the
//! head says it is sealed. Export does the reverse and bumps the local
//! version. Both are atomic from the caller's point of view: a failed
//! import returns no document and a failed export leaves the document as it
//! was.
//!
//! The iv and salt of an encrypted export are not embedded in the markup.
//! They come back as [`CipherParams`] and must be stored by the caller next
//! to the file.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams};
use crate::document::tree::{self, BODY, HEAD, ROOT};
use crate::document::{now, Body, Document, Head};
use crate::error::{HplError, Result, Stage};
use crate::markup::{self, BuildOptions, CodecConfig, Value};

/// Codec and key-derivation settings for an [`Engine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub codec: CodecConfig,
    /// Iteration count for encrypted exports. Documents that were sealed with
    /// more iterations keep their higher count.
    pub kdf: KdfParams,
}

/// Base64 iv and salt of one encrypted export. Not secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
    pub salt: String,
}

/// Result of [`Engine::export`].
#[derive(Debug, Clone)]
pub struct Exported {
    pub markup: String,
    /// Present exactly when a passphrase was supplied.
    pub params: Option<CipherParams>,
}

/// Import/export engine.
///
/// ```
/// use hpl_core::{Document, Engine, EngineConfig};
///
/// let engine = Engine::new(EngineConfig::default());
/// let mut doc = Document::new();
/// let exported = engine.export(&mut doc, None).unwrap();
///
/// assert!(engine.is_plain_xml(&exported.markup));
/// let reloaded = engine.import(&exported.markup, None, None).unwrap();
/// assert_eq!(reloaded.file_id(), doc.file_id());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a document from markup.
    ///
    /// # Errors
    ///
    /// - `HplError::Parse` for malformed markup or a broken document structure
    /// - `HplError::MissingCredentials` if the document is encrypted and the
    ///   passphrase or the cipher parameters are missing
    /// - `HplError::Authentication` if the body cannot be decrypted, for any
    ///   reason
    pub fn import(
        &self,
        markup: &str,
        passphrase: Option<&SecretString>,
        params: Option<&CipherParams>,
    ) -> Result<Document> {
        let parsed = markup::parse(markup, &self.config.codec).map_err(|e| e.at(Stage::ParseDocument))?;
        let (head_value, body_value) =
            tree::split_document(&parsed).map_err(|e| e.at(Stage::ReadDocument))?;
        let head = tree::head_from_value(head_value).map_err(|e| e.at(Stage::ReadDocument))?;

        if !head.is_encrypted {
            let body = tree::body_from_value(body_value).map_err(|e| e.at(Stage::ReadDocument))?;
            debug!(file_id = %head.file_id, tables = body.tables.len(), "imported plain document");
            return Ok(Document::from_parts(head, body));
        }

        let (passphrase, params) = match (passphrase, params) {
            (Some(passphrase), Some(params)) => (passphrase, params),
            _ => return Err(HplError::MissingCredentials),
        };

        // Checked before any key derivation: the head is not authenticated.
        let kdf = match head.kdf_iterations {
            Some(iterations) => KdfParams::new(iterations).map_err(|_| {
                HplError::Parse(format!("unsupported root.head.kdf_iterations {}", iterations))
                    .at(Stage::ReadDocument)
            })?,
            None => KdfParams::default(),
        };
        let payload = body_value.as_text().ok_or(HplError::Authentication)?;
        let body = self
            .open_body(payload, passphrase, params, head.file_id.as_bytes(), &kdf)
            .map_err(|_| HplError::Authentication)?;

        debug!(
            file_id = %head.file_id,
            tables = body.tables.len(),
            iterations = kdf.iterations(),
            "imported encrypted document"
        );
        Ok(Document::from_parts(head, body))
    }

    /// Read only the clear-text head. Works on encrypted documents without
    /// credentials.
    pub fn read_head(&self, markup: &str) -> Result<Head> {
        let parsed = markup::parse(markup, &self.config.codec).map_err(|e| e.at(Stage::ParseDocument))?;
        let (head_value, _) = tree::split_document(&parsed).map_err(|e| e.at(Stage::ReadDocument))?;
        tree::head_from_value(head_value).map_err(|e| e.at(Stage::ReadDocument))
    }

    fn open_body(
        &self,
        payload: &str,
        passphrase: &SecretString,
        params: &CipherParams,
        aad: &[u8],
        kdf: &KdfParams,
    ) -> Result<Body> {
        let decode = |text: &str| STANDARD.decode(text.trim()).map_err(|_| HplError::Authentication);
        let ciphertext = decode(payload)?;
        let iv = decode(&params.iv)?;
        let salt = decode(&params.salt)?;

        let plaintext = crypto::decrypt(
            &ciphertext,
            &iv,
            &salt,
            passphrase.expose_secret().as_bytes(),
            aad,
            kdf,
        )?;
        let fragment = std::str::from_utf8(&plaintext).map_err(|_| HplError::Authentication)?;

        let base_path = format!("{}.{}", ROOT, BODY);
        let value = markup::parse_at(fragment, &base_path, &self.config.codec)?;
        tree::body_from_value(&value)
    }

    /// Serialize a document, encrypting the body when a passphrase is given.
    ///
    /// Refreshes `updated_at`, bumps the local version and records whether
    /// (and with how many KDF iterations) the body was sealed. The document
    /// is only updated once the markup is complete.
    ///
    /// # Errors
    ///
    /// Returns `HplError::InvalidInput` for an empty passphrase and
    /// `HplError::Crypto` if encryption fails.
    pub fn export(&self, doc: &mut Document, passphrase: Option<&SecretString>) -> Result<Exported> {
        let mut head = doc.head.clone();
        head.updated_at = now();
        head.file_version = head.file_version.bumped()?;

        let (body_value, params) = match passphrase {
            None => {
                head.is_encrypted = false;
                head.kdf_iterations = None;
                (tree::body_to_value(&doc.body), None)
            }
            Some(passphrase) => {
                crypto::ensure_sealable(passphrase).map_err(|e| e.at(Stage::EncryptBody))?;
                let kdf = self.kdf_for(head.kdf_iterations);
                let fragment = Zeroizing::new(
                    markup::build(&tree::body_to_value(&doc.body), BuildOptions::compact())
                        .map_err(|e| e.at(Stage::BuildBody))?,
                );
                let sealed = crypto::encrypt(
                    fragment.as_bytes(),
                    passphrase.expose_secret().as_bytes(),
                    head.file_id.as_bytes(),
                    &kdf,
                )
                .map_err(|e| e.at(Stage::EncryptBody))?;

                head.is_encrypted = true;
                head.kdf_iterations = Some(kdf.iterations());
                let params = CipherParams {
                    iv: STANDARD.encode(sealed.iv),
                    salt: STANDARD.encode(sealed.salt),
                };
                (Value::text(STANDARD.encode(&sealed.ciphertext)), Some(params))
            }
        };

        let tree = tree::document_value(tree::head_to_value(&head), body_value);
        let markup = markup::build(&tree, BuildOptions::pretty()).map_err(|e| e.at(Stage::BuildDocument))?;

        debug!(
            file_id = %head.file_id,
            version = %head.file_version,
            encrypted = head.is_encrypted,
            "exported document"
        );
        doc.head = head;
        Ok(Exported { markup, params })
    }

    /// Iteration count for sealing a document last sealed with `recorded`.
    fn kdf_for(&self, recorded: Option<u32>) -> KdfParams {
        let configured = self.config.kdf;
        let kdf = configured.at_least(recorded);
        if kdf != configured {
            warn!(
                configured = configured.iterations(),
                recorded = kdf.iterations(),
                "refusing to lower PBKDF2 iterations; keeping the recorded count"
            );
        }
        kdf
    }

    /// Whether `markup` is a document whose head marks the body as encrypted.
    /// Needs no credentials.
    pub fn is_encrypted_xml(&self, markup: &str) -> bool {
        self.probe(markup, HEAD_IS_ENCRYPTED)
            .map_or(false, |flag| flag.trim() == "true")
    }

    /// Whether `markup` is a document with a clear-text body.
    pub fn is_plain_xml(&self, markup: &str) -> bool {
        matches!(
            self.probe(markup, HEAD_IS_ENCRYPTED).as_deref().map(str::trim),
            Some("false") | Some("")
        )
    }

    /// The document id from the head, without decrypting anything.
    pub fn file_id_from_xml(&self, markup: &str) -> Option<String> {
        self.probe(markup, HEAD_FILE_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Text of a head element, or `None` if the markup is not a document.
    /// A missing element reads as empty text.
    fn probe(&self, markup: &str, path: &str) -> Option<String> {
        let parsed = markup::parse(markup, &self.config.codec).ok()?;
        let head = parsed.pointer(&format!("{}.{}", ROOT, HEAD))?;
        match head.pointer(path) {
            Some(value) => value.as_text().map(str::to_string),
            None if head.as_map().is_some() => Some(String::new()),
            None => None,
        }
    }
}

const HEAD_IS_ENCRYPTED: &str = "is_encrypted";
const HEAD_FILE_ID: &str = "file_id";
