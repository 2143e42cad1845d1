//! Tables: named groups of accounts.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::account::{Account, AccountFields, AccountMut};
use super::{now, Document};
use crate::error::{HplError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) summary: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) accounts: Vec<Account>,
}

impl Table {
    pub(crate) fn new(id: String, name: &str, summary: &str, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            summary: summary.to_string(),
            created_at: at,
            updated_at: at,
            accounts: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Accounts in insertion order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, serial_number: u64) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.serial_number == serial_number)
    }

    fn position(&self, serial_number: u64) -> Option<usize> {
        self.accounts
            .iter()
            .position(|a| a.serial_number == serial_number)
    }
}

/// Mutable lens over one table.
pub struct TableMut<'a> {
    doc: &'a mut Document,
    index: usize,
}

impl<'a> TableMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, index: usize) -> Self {
        Self { doc, index }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.record_mut().name = name.into();
        self.touch();
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.record_mut().summary = summary.into();
        self.touch();
    }

    /// Append an account with the next serial number of this table.
    ///
    /// # Errors
    ///
    /// Returns `HplError::Validation` if a required field is missing or a
    /// column key is not allowed. The serial counter only advances on success.
    pub fn add_account(&mut self, fields: AccountFields) -> Result<AccountMut<'_>> {
        let account = self.push_account(fields)?;
        Ok(AccountMut::new(self.doc, self.index, account))
    }

    /// Consuming form of [`TableMut::add_account`].
    pub fn into_added_account(mut self, fields: AccountFields) -> Result<AccountMut<'a>> {
        let account = self.push_account(fields)?;
        Ok(AccountMut::new(self.doc, self.index, account))
    }

    pub fn account_mut(&mut self, serial_number: u64) -> Option<AccountMut<'_>> {
        let account = self.position(serial_number)?;
        Some(AccountMut::new(self.doc, self.index, account))
    }

    pub fn into_account_mut(self, serial_number: u64) -> Option<AccountMut<'a>> {
        let account = self.position(serial_number)?;
        Some(AccountMut::new(self.doc, self.index, account))
    }

    /// Remove an account. Its serial number is never handed out again.
    pub fn remove_account(&mut self, serial_number: u64) -> Option<Account> {
        let position = self.position(serial_number)?;
        let removed = self.record_mut().accounts.remove(position);
        self.touch();
        Some(removed)
    }

    fn push_account(&mut self, fields: AccountFields) -> Result<usize> {
        let serial_number = self.next_serial_number()?;
        let at = now();
        let account = fields.into_account(serial_number, at)?;

        self.commit_serial_number(serial_number);
        let table = self.record_mut();
        table.accounts.push(account);
        table.updated_at = at;
        let index = table.accounts.len() - 1;
        self.doc.touch(at);
        Ok(index)
    }

    fn next_serial_number(&self) -> Result<u64> {
        let id = &self.doc.body.tables[self.index].id;
        let counter = self
            .doc
            .body
            .sequence_counter(id)
            .ok_or_else(|| HplError::NotFound(format!("Sequence entry for table '{}'", id)))?;
        counter
            .checked_add(1)
            .ok_or_else(|| HplError::Validation(format!("Serial numbers exhausted in table '{}'", id)))
    }

    fn commit_serial_number(&mut self, serial_number: u64) {
        let body = &mut self.doc.body;
        let id = &body.tables[self.index].id;
        if let Some(entry) = body.sequence.iter_mut().find(|e| &e.table_id == id) {
            entry.counter = serial_number;
        }
    }

    fn record_mut(&mut self) -> &mut Table {
        &mut self.doc.body.tables[self.index]
    }

    fn touch(&mut self) {
        let at = now();
        self.record_mut().updated_at = at;
        self.doc.touch(at);
    }
}

impl Deref for TableMut<'_> {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.doc.body.tables[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> AccountFields {
        AccountFields::new()
            .service_name(name)
            .initial(&name[..1])
            .category("misc")
            .summary("")
            .status("active")
    }

    #[test]
    fn test_serials_never_reused_after_removal() {
        let mut doc = Document::new();
        let mut table = doc.add_table("Mail", "").unwrap();

        assert_eq!(table.add_account(fields("Alpha")).unwrap().serial_number(), 1);
        assert_eq!(table.add_account(fields("Beta")).unwrap().serial_number(), 2);
        assert_eq!(table.remove_account(2).unwrap().service_name(), "Beta");
        assert_eq!(table.add_account(fields("Gamma")).unwrap().serial_number(), 3);

        let id = table.id().to_string();
        assert_eq!(doc.body().sequence_counter(&id), Some(3));
        let serials: Vec<u64> = doc
            .table(&id)
            .unwrap()
            .accounts()
            .iter()
            .map(Account::serial_number)
            .collect();
        assert_eq!(serials, vec![1, 3]);
    }

    #[test]
    fn test_failed_add_keeps_counter() {
        let mut doc = Document::new();
        let mut table = doc.add_table("Mail", "").unwrap();

        assert!(table.add_account(AccountFields::new().service_name("x")).is_err());
        assert_eq!(table.add_account(fields("Alpha")).unwrap().serial_number(), 1);
    }

    #[test]
    fn test_lookups_by_serial() {
        let mut doc = Document::new();
        let mut table = doc.add_table("Mail", "").unwrap();
        table.add_account(fields("Alpha")).unwrap();

        assert!(table.account(1).is_some());
        assert!(table.account(7).is_none());
        assert!(table.account_mut(7).is_none());
        assert!(table.remove_account(7).is_none());
    }

    #[test]
    fn test_rename_bumps_timestamps() {
        let mut doc = Document::new();
        let id = doc.add_table("Mail", "old").unwrap().id().to_string();
        let created = doc.table(&id).unwrap().updated_at();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let mut table = doc.table_mut(&id).unwrap();
        table.set_name("Email");
        table.set_summary("new");

        let table = doc.table(&id).unwrap();
        assert_eq!((table.name(), table.summary()), ("Email", "new"));
        assert!(table.updated_at() > created);
        assert_eq!(table.created_at(), created);
        assert_eq!(doc.head().updated_at(), table.updated_at());
    }
}
