//! Command handlers.

mod accounts;
mod columns;
mod info;
mod init;
mod passphrase;
mod tables;

use crate::app::AppContext;
use crate::cli::Commands;

pub fn dispatch(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    match &ctx.cli().command {
        Commands::Init(args) => init::handle_init(ctx, args),
        Commands::Info { json } => info::handle_info(ctx, *json),
        Commands::Table(command) => tables::handle_table(ctx, command),
        Commands::Account(command) => accounts::handle_account(ctx, command),
        Commands::Column(command) => columns::handle_column(ctx, command),
        Commands::Passphrase(command) => passphrase::handle_passphrase(ctx, command),
    }
}
