//! HPL CLI - a local, passphrase-protected credential store
//!
//! Command-line front end over `hpl-core`: it owns file I/O, passphrase
//! prompts, the iv/salt key file and the session file, and leaves the
//! document format and cryptography to the core library.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod keyfile;
mod output;
mod session;

use clap::Parser;
use hpl_core::HplError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::AppContext;
use crate::cli::Cli;

/// Exit codes
const EXIT_FAILURE: i32 = 1;
const EXIT_AUTH: i32 = 3;
const EXIT_NOT_FOUND: i32 = 4;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli)?;
    commands::dispatch(&ctx)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HPL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<HplError>() {
        Some(HplError::Authentication | HplError::MissingCredentials) => EXIT_AUTH,
        Some(HplError::NotFound(_)) => EXIT_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}
