use hpl_core::HplError;

use crate::app::AppContext;
use crate::cli::AccountCommand;
use crate::helpers::account_fields;
use crate::output::{account_json, accounts_json, print_account, print_accounts};

use super::tables::table_not_found;

pub fn handle_account(ctx: &AppContext<'_>, command: &AccountCommand) -> anyhow::Result<()> {
    match command {
        AccountCommand::Add { table, fields } => {
            let fields = account_fields(fields)?;
            let mut open = ctx.open()?;
            let serial = open.document.add_account(table, fields)?.serial_number();
            ctx.save(&mut open)?;
            if ctx.quiet() {
                println!("{}", serial);
            } else {
                println!("Added account {} to {}", serial, table);
            }
        }
        AccountCommand::List { table, json } => {
            let open = ctx.open()?;
            let accounts = open
                .document
                .table(table)
                .ok_or_else(|| table_not_found(table))?
                .accounts();
            if *json {
                println!("{}", serde_json::to_string_pretty(&accounts_json(accounts))?);
            } else {
                print_accounts(open.document.head().options(), accounts);
            }
        }
        AccountCommand::Show {
            table,
            serial,
            json,
        } => {
            let open = ctx.open()?;
            let account = open
                .document
                .table(table)
                .ok_or_else(|| table_not_found(table))?
                .account(*serial)
                .ok_or_else(|| account_not_found(table, *serial))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&account_json(account))?);
            } else {
                print_account(open.document.head().options(), account);
            }
        }
        AccountCommand::Update {
            table,
            serial,
            fields,
            remove_fields,
        } => {
            let fields = account_fields(fields)?;
            if fields.is_empty() && remove_fields.is_empty() {
                return Err(anyhow::anyhow!("Nothing to change"));
            }
            let mut open = ctx.open()?;
            {
                let mut account = open
                    .document
                    .account_mut(table, *serial)
                    .ok_or_else(|| account_not_found(table, *serial))?;
                if !fields.is_empty() {
                    account.update(fields)?;
                }
                for key in remove_fields {
                    if account.remove_field(key)?.is_none() {
                        return Err(anyhow::anyhow!(
                            "Account {} has no field '{}'",
                            serial,
                            key
                        ));
                    }
                }
            }
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                println!("Updated account {} in {}", serial, table);
            }
        }
        AccountCommand::Remove { table, serial } => {
            let mut open = ctx.open()?;
            open.document
                .table_mut(table)
                .ok_or_else(|| table_not_found(table))?
                .remove_account(*serial)
                .ok_or_else(|| account_not_found(table, *serial))?;
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                println!("Removed account {} from {}", serial, table);
            }
        }
    }
    Ok(())
}

fn account_not_found(table: &str, serial: u64) -> anyhow::Error {
    HplError::NotFound(format!("Account {} in table {}", serial, table)).into()
}
