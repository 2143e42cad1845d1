//! Output formatting for the CLI.
//!
//! - `json`: machine-readable output for `--json`
//! - `text`: human-readable tables

mod json;
mod text;

use std::collections::BTreeSet;

use hpl_core::document::STANDARD_COLUMNS;
use hpl_core::{Account, Options};

pub use json::{account_json, accounts_json, info_json, tables_json};
pub use text::{print_account, print_accounts, print_info, print_tables};

/// Columns to display for a set of accounts, in display order.
///
/// Explicitly ordered columns come first, then the remaining standard
/// columns, then extra columns sorted by key. Hidden columns are dropped.
pub fn account_columns(options: &Options, accounts: &[Account]) -> Vec<String> {
    let extras: BTreeSet<&str> = accounts
        .iter()
        .flat_map(|account| account.fields().keys().map(String::as_str))
        .collect();

    let mut keys: Vec<String> = Vec::new();
    let ordered = options.column_order().iter().map(String::as_str);
    for key in ordered.chain(STANDARD_COLUMNS).chain(extras) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys.retain(|key| options.is_visible(key));
    keys
}
