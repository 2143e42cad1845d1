//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use hpl_core::VERSION;

/// HPL - a local, passphrase-protected credential store
#[derive(Parser)]
#[command(name = "hpl")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the document file
    #[arg(short, long, global = true, env = "HPL_FILE")]
    pub file: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new document
    Init(InitArgs),

    /// Show document metadata without decrypting it
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage tables
    #[command(subcommand)]
    Table(TableCommand),

    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Manage column display options
    #[command(subcommand)]
    Column(ColumnCommand),

    /// Encrypt, re-key or decrypt the document
    #[command(subcommand)]
    Passphrase(PassphraseCommand),
}

#[derive(Args)]
pub struct InitArgs {
    /// Where to create the document
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Document description
    #[arg(long)]
    pub description: Option<String>,

    /// Encrypt the body with a passphrase
    #[arg(long)]
    pub encrypt: bool,
}

#[derive(Subcommand)]
pub enum TableCommand {
    /// Create a table
    Add {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(long, default_value = "")]
        summary: String,
    },

    /// List tables
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename a table or change its summary
    Rename {
        #[arg(value_name = "TABLE_ID")]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        summary: Option<String>,
    },

    /// Delete a table and all of its accounts
    Remove {
        #[arg(value_name = "TABLE_ID")]
        id: String,
    },
}

/// Standard account columns as flags.
#[derive(Args, Default)]
pub struct AccountFieldArgs {
    /// Service name
    #[arg(long)]
    pub name: Option<String>,

    /// Login / initial
    #[arg(long)]
    pub initial: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    /// Extra column (repeatable), e.g. --field password=hunter2
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Add an account to a table
    Add {
        #[arg(value_name = "TABLE_ID")]
        table: String,

        #[command(flatten)]
        fields: AccountFieldArgs,
    },

    /// List the accounts of a table
    List {
        #[arg(value_name = "TABLE_ID")]
        table: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one account
    Show {
        #[arg(value_name = "TABLE_ID")]
        table: String,

        #[arg(value_name = "SERIAL")]
        serial: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an account
    Update {
        #[arg(value_name = "TABLE_ID")]
        table: String,

        #[arg(value_name = "SERIAL")]
        serial: u64,

        #[command(flatten)]
        fields: AccountFieldArgs,

        /// Remove an extra column (repeatable)
        #[arg(long = "remove-field", value_name = "KEY")]
        remove_fields: Vec<String>,
    },

    /// Delete an account
    Remove {
        #[arg(value_name = "TABLE_ID")]
        table: String,

        #[arg(value_name = "SERIAL")]
        serial: u64,
    },
}

#[derive(Subcommand)]
pub enum ColumnCommand {
    /// Set the display label of a column
    Alias {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "LABEL")]
        label: String,
    },

    /// Drop the display label of a column
    Unalias {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Set the column display order (no keys clears it)
    Order {
        #[arg(value_name = "KEY")]
        keys: Vec<String>,
    },

    /// Hide a column
    Hide {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Show a hidden column again
    Show {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[derive(Subcommand)]
pub enum PassphraseCommand {
    /// Encrypt the document, or change its passphrase
    Set,

    /// Store the document unencrypted
    Clear,
}
