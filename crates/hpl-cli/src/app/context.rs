//! Application context for the HPL CLI.
//!
//! Bundles CLI arguments with the loaded configuration and the engine built
//! from it.

use std::io::IsTerminal;
use std::path::PathBuf;

use hpl_core::Engine;

use crate::cli::Cli;
use crate::config::{read_config_or_default, HplConfig};

use super::document::{save_document, OpenDocument};
use super::passphrase::open_document_with_retry;
use super::resolver::{resolve_config_path, resolve_document_path};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: HplConfig,
    engine: Engine,
}

impl<'a> AppContext<'a> {
    /// Load configuration and build the engine.
    pub fn new(cli: &'a Cli) -> anyhow::Result<Self> {
        let config = read_config_or_default(&resolve_config_path()?)?;
        let engine = Engine::new(config.engine_config()?);
        Ok(Self {
            cli,
            config,
            engine,
        })
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts may be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    pub fn config(&self) -> &HplConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn document_path(&self) -> anyhow::Result<PathBuf> {
        resolve_document_path(self.cli, &self.config)
    }

    /// Load the current document, asking for the passphrase if needed.
    pub fn open(&self) -> anyhow::Result<OpenDocument> {
        open_document_with_retry(self, self.document_path()?)
    }

    /// Export and write back a document opened with [`AppContext::open`].
    pub fn save(&self, open: &mut OpenDocument) -> anyhow::Result<()> {
        save_document(&self.engine, open)
    }
}
