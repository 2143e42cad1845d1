use hpl_core::HplError;

use crate::app::AppContext;
use crate::cli::TableCommand;
use crate::output::{print_tables, tables_json};

pub fn handle_table(ctx: &AppContext<'_>, command: &TableCommand) -> anyhow::Result<()> {
    match command {
        TableCommand::Add { name, summary } => {
            let mut open = ctx.open()?;
            let id = open.document.add_table(name, summary)?.id().to_string();
            ctx.save(&mut open)?;
            if ctx.quiet() {
                println!("{}", id);
            } else {
                println!("Created table {} ({})", id, name);
            }
        }
        TableCommand::List { json } => {
            let open = ctx.open()?;
            let body = open.document.body();
            if *json {
                println!("{}", serde_json::to_string_pretty(&tables_json(body))?);
            } else {
                print_tables(body);
            }
        }
        TableCommand::Rename { id, name, summary } => {
            if name.is_none() && summary.is_none() {
                return Err(anyhow::anyhow!("Nothing to change: pass --name or --summary"));
            }
            let mut open = ctx.open()?;
            {
                let mut table = open
                    .document
                    .table_mut(id)
                    .ok_or_else(|| table_not_found(id))?;
                if let Some(name) = name {
                    table.set_name(name.as_str());
                }
                if let Some(summary) = summary {
                    table.set_summary(summary.as_str());
                }
            }
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                println!("Updated table {}", id);
            }
        }
        TableCommand::Remove { id } => {
            let mut open = ctx.open()?;
            let removed = open
                .document
                .remove_table(id)
                .ok_or_else(|| table_not_found(id))?;
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                println!(
                    "Removed table {} ({} accounts)",
                    id,
                    removed.accounts().len()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn table_not_found(id: &str) -> anyhow::Error {
    HplError::NotFound(format!("Table {}", id)).into()
}
