//! JSON output formatting.

use std::path::Path;

use hpl_core::{Account, Body, Head};
use serde_json::{json, Map, Value};

pub fn info_json(path: &Path, head: &Head, tables: Option<usize>) -> Value {
    json!({
        "path": path.to_string_lossy(),
        "file_id": head.file_id(),
        "file_version": head.file_version().to_string(),
        "title": head.title(),
        "description": head.description(),
        "created_at": head.created_at(),
        "updated_at": head.updated_at(),
        "is_encrypted": head.is_encrypted(),
        "kdf_iterations": head.kdf_iterations(),
        "tables": tables,
    })
}

pub fn tables_json(body: &Body) -> Value {
    let tables: Vec<Value> = body
        .tables()
        .iter()
        .map(|table| {
            json!({
                "id": table.id(),
                "name": table.name(),
                "summary": table.summary(),
                "accounts": table.accounts().len(),
                "counter": body.sequence_counter(table.id()),
                "created_at": table.created_at(),
                "updated_at": table.updated_at(),
            })
        })
        .collect();
    Value::Array(tables)
}

/// An account keyed by column, hidden columns included.
pub fn account_json(account: &Account) -> Value {
    let mut object = Map::new();
    object.insert("sn".to_string(), json!(account.serial_number()));
    object.insert("nm".to_string(), json!(account.service_name()));
    object.insert("it".to_string(), json!(account.initial()));
    object.insert("ct".to_string(), json!(account.category()));
    object.insert("sm".to_string(), json!(account.summary()));
    object.insert("st".to_string(), json!(account.status()));
    object.insert("ca".to_string(), json!(account.created_at()));
    object.insert("ua".to_string(), json!(account.updated_at()));
    for (key, value) in account.fields() {
        object.insert(key.clone(), json!(value));
    }
    Value::Object(object)
}

pub fn accounts_json(accounts: &[Account]) -> Value {
    Value::Array(accounts.iter().map(account_json).collect())
}
