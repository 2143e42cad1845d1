//! Accounts: the credential records held by a table.

use std::collections::BTreeMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{now, Document};
use crate::error::{HplError, Result};

pub const SERIAL_NUMBER: &str = "sn";
pub const SERVICE_NAME: &str = "nm";
pub const INITIAL: &str = "it";
pub const CATEGORY: &str = "ct";
pub const SUMMARY: &str = "sm";
pub const STATUS: &str = "st";
pub const CREATED_AT: &str = "ca";
pub const UPDATED_AT: &str = "ua";

/// Columns every account has, in wire order.
pub const STANDARD_COLUMNS: [&str; 8] = [
    SERIAL_NUMBER,
    SERVICE_NAME,
    INITIAL,
    CATEGORY,
    SUMMARY,
    STATUS,
    CREATED_AT,
    UPDATED_AT,
];

/// Fields a caller must provide when creating an account.
const REQUIRED_FIELDS: [&str; 5] = [SERVICE_NAME, INITIAL, CATEGORY, SUMMARY, STATUS];

/// Columns owned by the document itself; callers never write them.
const MANAGED_FIELDS: [&str; 3] = [SERIAL_NUMBER, CREATED_AT, UPDATED_AT];

/// Check that `key` names a column: a standard one or a well-formed extra field.
///
/// Extra field names start with an ASCII letter, followed by ASCII
/// alphanumerics, `-` or `_`, so they are always valid element names.
pub fn validate_column_key(key: &str) -> Result<()> {
    if STANDARD_COLUMNS.contains(&key) || is_extra_field_name(key) {
        Ok(())
    } else {
        Err(HplError::Validation(format!("Unknown column key '{}'", key)))
    }
}

fn is_extra_field_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

/// One credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub(crate) serial_number: u64,
    pub(crate) service_name: String,
    pub(crate) initial: String,
    pub(crate) category: String,
    pub(crate) summary: String,
    pub(crate) status: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) fields: BTreeMap<String, String>,
}

impl Account {
    pub fn serial_number(&self) -> u64 {
        self.serial_number
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Extra credential columns (user id, password, url, ...).
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Text of any column by key, as it appears on the wire.
    pub fn column(&self, key: &str) -> Option<String> {
        match key {
            SERIAL_NUMBER => Some(self.serial_number.to_string()),
            SERVICE_NAME => Some(self.service_name.clone()),
            INITIAL => Some(self.initial.clone()),
            CATEGORY => Some(self.category.clone()),
            SUMMARY => Some(self.summary.clone()),
            STATUS => Some(self.status.clone()),
            CREATED_AT => Some(super::tree::format_timestamp(self.created_at)),
            UPDATED_AT => Some(super::tree::format_timestamp(self.updated_at)),
            other => self.fields.get(other).cloned(),
        }
    }

    fn apply(&mut self, values: BTreeMap<String, String>) {
        for (key, value) in values {
            match key.as_str() {
                SERVICE_NAME => self.service_name = value,
                INITIAL => self.initial = value,
                CATEGORY => self.category = value,
                SUMMARY => self.summary = value,
                STATUS => self.status = value,
                _ => {
                    self.fields.insert(key, value);
                }
            }
        }
    }
}

/// Field values for creating or updating an account.
///
/// ```
/// use hpl_core::AccountFields;
///
/// let fields = AccountFields::new()
///     .service_name("Bank")
///     .initial("B")
///     .category("finance")
///     .summary("checking")
///     .status("active")
///     .field("user", "alice");
/// assert_eq!(fields.get("nm"), Some("Bank"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFields {
    values: BTreeMap<String, String>,
}

impl AccountFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service_name(self, value: impl Into<String>) -> Self {
        self.field(SERVICE_NAME, value)
    }

    pub fn initial(self, value: impl Into<String>) -> Self {
        self.field(INITIAL, value)
    }

    pub fn category(self, value: impl Into<String>) -> Self {
        self.field(CATEGORY, value)
    }

    pub fn summary(self, value: impl Into<String>) -> Self {
        self.field(SUMMARY, value)
    }

    pub fn status(self, value: impl Into<String>) -> Self {
        self.field(STATUS, value)
    }

    /// Set any column by key. Keys are checked when the fields are applied.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for key in self.values.keys() {
            validate_column_key(key)?;
            if MANAGED_FIELDS.contains(&key.as_str()) {
                return Err(HplError::Validation(format!(
                    "Column '{}' is managed by the document and cannot be set",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Build a new account. Presence of each required field is checked;
    /// empty values are allowed.
    pub(crate) fn into_account(mut self, serial_number: u64, at: DateTime<Utc>) -> Result<Account> {
        self.validate()?;
        for field in REQUIRED_FIELDS {
            if !self.values.contains_key(field) {
                return Err(HplError::Validation(format!(
                    "Missing required field in account data: {}",
                    field
                )));
            }
        }

        let mut take = |key: &str| self.values.remove(key).unwrap_or_default();
        let service_name = take(SERVICE_NAME);
        let initial = take(INITIAL);
        let category = take(CATEGORY);
        let summary = take(SUMMARY);
        let status = take(STATUS);

        Ok(Account {
            serial_number,
            service_name,
            initial,
            category,
            summary,
            status,
            created_at: at,
            updated_at: at,
            fields: self.values,
        })
    }
}

/// Mutable lens over one account.
///
/// Writes bump the account, its table and the document head together.
pub struct AccountMut<'a> {
    doc: &'a mut Document,
    table: usize,
    account: usize,
}

impl<'a> AccountMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, table: usize, account: usize) -> Self {
        Self {
            doc,
            table,
            account,
        }
    }

    /// Merge `fields` into the account, last write wins per field.
    ///
    /// # Errors
    ///
    /// Returns `HplError::Validation` for an unknown or document-managed
    /// column key; the account is left unchanged in that case.
    pub fn update(&mut self, fields: AccountFields) -> Result<()> {
        fields.validate()?;
        self.record_mut().apply(fields.values);
        self.touch();
        Ok(())
    }

    /// Remove an extra field. Standard columns cannot be removed.
    pub fn remove_field(&mut self, key: &str) -> Result<Option<String>> {
        if STANDARD_COLUMNS.contains(&key) {
            return Err(HplError::Validation(format!(
                "Column '{}' is a standard column and cannot be removed",
                key
            )));
        }
        let removed = self.record_mut().fields.remove(key);
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    fn record_mut(&mut self) -> &mut Account {
        &mut self.doc.body.tables[self.table].accounts[self.account]
    }

    fn touch(&mut self) {
        let at = now();
        let table = &mut self.doc.body.tables[self.table];
        table.accounts[self.account].updated_at = at;
        table.updated_at = at;
        self.doc.touch(at);
    }
}

impl Deref for AccountMut<'_> {
    type Target = Account;

    fn deref(&self) -> &Account {
        &self.doc.body.tables[self.table].accounts[self.account]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> AccountFields {
        AccountFields::new()
            .service_name("Bank")
            .initial("B")
            .category("finance")
            .summary("desc")
            .status("active")
    }

    #[test]
    fn test_column_keys() {
        for key in STANDARD_COLUMNS {
            assert!(validate_column_key(key).is_ok());
        }
        assert!(validate_column_key("password").is_ok());
        assert!(validate_column_key("user-id_2").is_ok());

        assert!(validate_column_key("").is_err());
        assert!(validate_column_key("2fa").is_err());
        assert!(validate_column_key("with space").is_err());
        assert!(validate_column_key("_id").is_err());
        assert!(validate_column_key("#text").is_err());
    }

    #[test]
    fn test_missing_required_field() {
        let fields = AccountFields::new()
            .service_name("Bank")
            .initial("B")
            .category("finance")
            .summary("desc");
        let err = fields.into_account(1, now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required field in account data: st"
        );
    }

    #[test]
    fn test_empty_required_values_are_present() {
        let fields = AccountFields::new()
            .service_name("")
            .initial("")
            .category("")
            .summary("")
            .status("");
        assert!(fields.into_account(1, now()).is_ok());
    }

    #[test]
    fn test_extra_fields_are_kept_apart() {
        let account = complete()
            .field("password", "hunter22")
            .into_account(3, now())
            .unwrap();

        assert_eq!(account.service_name(), "Bank");
        assert_eq!(account.field("password"), Some("hunter22"));
        assert_eq!(account.fields().len(), 1);
        assert_eq!(account.column("sn").as_deref(), Some("3"));
        assert_eq!(account.column("password").as_deref(), Some("hunter22"));
        assert_eq!(account.column("url"), None);
    }

    #[test]
    fn test_managed_columns_rejected() {
        let err = complete().field("sn", "9").into_account(1, now()).unwrap_err();
        assert!(matches!(err, HplError::Validation(_)));

        let err = complete().field("bad key", "x").into_account(1, now()).unwrap_err();
        assert!(err.to_string().contains("Unknown column key"));
    }

    #[test]
    fn test_update_merges_and_remove_field() {
        let mut doc = Document::new();
        let table_id = doc.add_table("Banking", "").unwrap().id().to_string();
        doc.add_account(&table_id, complete().field("url", "https://bank.example"))
            .unwrap();

        let mut account = doc.account_mut(&table_id, 1).unwrap();
        account
            .update(AccountFields::new().summary("savings").field("memo", "joint"))
            .unwrap();
        assert_eq!(account.summary(), "savings");
        assert_eq!(account.service_name(), "Bank");
        assert_eq!(account.field("memo"), Some("joint"));

        assert_eq!(account.remove_field("url").unwrap().as_deref(), Some("https://bank.example"));
        assert_eq!(account.remove_field("url").unwrap(), None);
        assert!(account.remove_field("nm").is_err());
    }

    #[test]
    fn test_rejected_update_leaves_account_alone() {
        let mut doc = Document::new();
        let table_id = doc.add_table("Banking", "").unwrap().id().to_string();
        doc.add_account(&table_id, complete()).unwrap();
        let before = doc.clone();

        let mut account = doc.account_mut(&table_id, 1).unwrap();
        let result = account.update(AccountFields::new().status("closed").field("ua", "x"));

        assert!(result.is_err());
        assert_eq!(doc, before);
    }
}
