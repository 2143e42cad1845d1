//! The credential document model.
//!
//! A [`Document`] owns one [`Head`] (clear metadata and display options) and
//! one [`Body`] (tables of accounts). Read access goes through plain
//! references (`&Head`, `&Table`, ...). Writes go through short-lived lenses
//! (`HeadMut`, `OptionsMut`, `BodyMut`, `TableMut`, `AccountMut`) that borrow
//! the document mutably and address entities by index, so the borrow checker
//! enforces a single writer and every write can bump the right timestamps.

mod account;
mod body;
mod head;
mod table;
pub(crate) mod tree;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use account::{
    validate_column_key, Account, AccountFields, AccountMut, CATEGORY, CREATED_AT, INITIAL,
    SERIAL_NUMBER, SERVICE_NAME, STANDARD_COLUMNS, STATUS, SUMMARY, UPDATED_AT,
};
pub use body::{Body, BodyMut, SequenceEntry, TABLE_ID_PREFIX};
pub use head::{FileVersion, Head, HeadMut, Options, OptionsMut};
pub use table::{Table, TableMut};

use crate::error::{HplError, Result};

/// Prefix of every document identifier.
pub const FILE_ID_PREFIX: &str = "HPL-";

/// Current time at the precision the markup format stores.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// One credential file: head metadata plus the (possibly sensitive) body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub(crate) head: Head,
    pub(crate) body: Body,
}

impl Document {
    /// Create an empty, unencrypted document with a fresh identifier.
    pub fn new() -> Self {
        let created = now();
        Self {
            head: Head::new(format!("{}{}", FILE_ID_PREFIX, Uuid::new_v4()), created),
            body: Body::default(),
        }
    }

    pub(crate) fn from_parts(head: Head, body: Body) -> Self {
        Self { head, body }
    }

    pub fn file_id(&self) -> &str {
        self.head.file_id()
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn head_mut(&mut self) -> HeadMut<'_> {
        HeadMut::new(&mut self.head)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> BodyMut<'_> {
        BodyMut::new(self)
    }

    /// Look up a table by id.
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.body.table(table_id)
    }

    /// Mutable lens onto an existing table, or `None` if there is no such table.
    pub fn table_mut(&mut self, table_id: &str) -> Option<TableMut<'_>> {
        self.body_mut().into_table_mut(table_id)
    }

    /// Create a table; see [`BodyMut::add_table`].
    pub fn add_table(&mut self, name: &str, summary: &str) -> Result<TableMut<'_>> {
        self.body_mut().into_added_table(name, summary)
    }

    /// Remove a table and its serial counter. Returns `None` if it did not exist.
    pub fn remove_table(&mut self, table_id: &str) -> Option<Table> {
        self.body_mut().remove_table(table_id)
    }

    /// Add an account to an existing table.
    ///
    /// # Errors
    ///
    /// Returns `HplError::NotFound` if the table does not exist and
    /// `HplError::Validation` if a required field is missing.
    pub fn add_account(&mut self, table_id: &str, fields: AccountFields) -> Result<AccountMut<'_>> {
        let table = self
            .table_mut(table_id)
            .ok_or_else(|| HplError::NotFound(format!("Table with id '{}'", table_id)))?;
        table.into_added_account(fields)
    }

    /// Mutable lens onto one account, addressed by table id and serial number.
    pub fn account_mut(&mut self, table_id: &str, serial_number: u64) -> Option<AccountMut<'_>> {
        self.table_mut(table_id)?.into_account_mut(serial_number)
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.head.updated_at = at;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
