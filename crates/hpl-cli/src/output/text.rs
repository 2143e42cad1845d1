//! Human-readable output.

use std::path::Path;

use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::{ContentArrangement, Table as ComfyTable};
use hpl_core::{Account, Body, Head, Options};

use super::account_columns;

pub fn print_info(path: &Path, head: &Head, tables: Option<usize>) {
    let mut table = ComfyTable::new();
    table.load_preset(NOTHING);
    table.add_row(vec!["Path".to_string(), path.display().to_string()]);
    table.add_row(vec!["File ID".to_string(), head.file_id().to_string()]);
    table.add_row(vec!["Version".to_string(), head.file_version().to_string()]);
    if !head.title().is_empty() {
        table.add_row(vec!["Title".to_string(), head.title().to_string()]);
    }
    if !head.description().is_empty() {
        table.add_row(vec!["Description".to_string(), head.description().to_string()]);
    }
    table.add_row(vec!["Created".to_string(), head.created_at().to_rfc3339()]);
    table.add_row(vec!["Updated".to_string(), head.updated_at().to_rfc3339()]);
    let encryption = match head.kdf_iterations() {
        Some(iterations) if head.is_encrypted() => format!("yes ({} PBKDF2 iterations)", iterations),
        _ if head.is_encrypted() => "yes".to_string(),
        _ => "no".to_string(),
    };
    table.add_row(vec!["Encrypted".to_string(), encryption]);
    if let Some(count) = tables {
        table.add_row(vec!["Tables".to_string(), count.to_string()]);
    }
    println!("{table}");
}

pub fn print_tables(body: &Body) {
    if body.tables().is_empty() {
        println!("No tables.");
        return;
    }

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Summary", "Accounts"]);
    for entry in body.tables() {
        table.add_row(vec![
            entry.id().to_string(),
            entry.name().to_string(),
            entry.summary().to_string(),
            entry.accounts().len().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn print_accounts(options: &Options, accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts.");
        return;
    }

    let columns = account_columns(options, accounts);
    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|key| options.label(key)).collect::<Vec<_>>());
    for account in accounts {
        table.add_row(
            columns
                .iter()
                .map(|key| account.column(key).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");
}

/// One account as label/value pairs.
pub fn print_account(options: &Options, account: &Account) {
    let mut table = ComfyTable::new();
    table.load_preset(NOTHING);
    for key in account_columns(options, std::slice::from_ref(account)) {
        let value = account.column(&key).unwrap_or_default();
        table.add_row(vec![options.label(&key).to_string(), value]);
    }
    println!("{table}");
}
