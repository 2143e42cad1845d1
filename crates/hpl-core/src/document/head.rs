//! Document head: identity, version, timestamps and display options.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::account::validate_column_key;
use super::now;
use crate::error::{HplError, Result};

/// Two-part document version: `system.local`.
///
/// `system` is operator-controlled; `local` advances by one on every export.
/// A version written without a local part (`"3"`) reads as local 0 when bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileVersion {
    system: u32,
    local: Option<u32>,
}

impl FileVersion {
    pub fn new(system: u32, local: u32) -> Self {
        Self {
            system,
            local: Some(local),
        }
    }

    pub fn system(&self) -> u32 {
        self.system
    }

    pub fn local(&self) -> u32 {
        self.local.unwrap_or(0)
    }

    /// The version after one more export.
    pub fn bumped(self) -> Result<Self> {
        let local = self
            .local()
            .checked_add(1)
            .ok_or_else(|| HplError::Validation(format!("file version {} cannot be bumped", self)))?;
        Ok(Self::new(self.system, local))
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.local {
            Some(local) => write!(f, "{}.{}", self.system, local),
            None => write!(f, "{}", self.system),
        }
    }
}

impl FromStr for FileVersion {
    type Err = HplError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || HplError::Parse(format!("invalid file version '{}'", value));
        match value.split_once('.') {
            Some((system, local)) => Ok(Self {
                system: system.parse().map_err(|_| invalid())?,
                local: Some(local.parse().map_err(|_| invalid())?),
            }),
            None => Ok(Self {
                system: value.parse().map_err(|_| invalid())?,
                local: None,
            }),
        }
    }
}

impl Serialize for FileVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Display preferences stored in the head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    pub(crate) column_alias: BTreeMap<String, String>,
    pub(crate) column_order: Vec<String>,
    pub(crate) invisible_columns: BTreeSet<String>,
}

impl Options {
    /// Column key → display label.
    pub fn column_alias(&self) -> &BTreeMap<String, String> {
        &self.column_alias
    }

    /// Display label for a column, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.column_alias.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Explicit display order. May be partial or empty.
    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    pub fn invisible_columns(&self) -> &BTreeSet<String> {
        &self.invisible_columns
    }

    pub fn is_visible(&self, key: &str) -> bool {
        !self.invisible_columns.contains(key)
    }
}

/// Clear-text metadata of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Head {
    pub(crate) file_id: String,
    pub(crate) file_version: FileVersion,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) is_encrypted: bool,
    pub(crate) kdf_iterations: Option<u32>,
    pub(crate) options: Options,
}

impl Head {
    pub(crate) fn new(file_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            file_id,
            file_version: FileVersion::new(1, 0),
            title: String::new(),
            description: String::new(),
            created_at,
            updated_at: created_at,
            is_encrypted: false,
            kdf_iterations: None,
            options: Options::default(),
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_version(&self) -> FileVersion {
        self.file_version
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the body was sealed with a passphrase at the most recent export.
    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    /// PBKDF2 iteration count used for the most recent encrypted export.
    pub fn kdf_iterations(&self) -> Option<u32> {
        self.kdf_iterations
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Mutable lens over the head. Every change refreshes `updated_at`.
pub struct HeadMut<'a> {
    head: &'a mut Head,
}

impl<'a> HeadMut<'a> {
    pub(crate) fn new(head: &'a mut Head) -> Self {
        Self { head }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.head.title = title.into();
        self.head.updated_at = now();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.head.description = description.into();
        self.head.updated_at = now();
    }

    /// Set the operator-controlled system version; the local part restarts at 0.
    pub fn set_system_version(&mut self, system: u32) {
        self.head.file_version = FileVersion::new(system, 0);
        self.head.updated_at = now();
    }

    pub fn options(&mut self) -> OptionsMut<'_> {
        OptionsMut { head: self.head }
    }

    pub fn into_options(self) -> OptionsMut<'a> {
        OptionsMut { head: self.head }
    }
}

impl Deref for HeadMut<'_> {
    type Target = Head;

    fn deref(&self) -> &Head {
        self.head
    }
}

/// Mutable lens over the display options.
///
/// Aliases are upserted by key, the order list is replaced wholesale and
/// invisible columns behave as a set.
pub struct OptionsMut<'a> {
    head: &'a mut Head,
}

impl OptionsMut<'_> {
    pub fn set_column_alias(&mut self, key: &str, label: impl Into<String>) -> Result<()> {
        validate_column_key(key)?;
        self.head
            .options
            .column_alias
            .insert(key.to_string(), label.into());
        self.touch();
        Ok(())
    }

    /// Returns `false` if the key had no alias.
    pub fn remove_column_alias(&mut self, key: &str) -> bool {
        let removed = self.head.options.column_alias.remove(key).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear_column_alias(&mut self) {
        self.head.options.column_alias.clear();
        self.touch();
    }

    /// Replace the display order. Keys must be known and distinct.
    pub fn set_column_order<I, S>(&mut self, order: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = Vec::new();
        for key in order {
            let key = key.into();
            validate_column_key(&key)?;
            if keys.contains(&key) {
                return Err(HplError::Validation(format!(
                    "Column '{}' appears more than once in the column order",
                    key
                )));
            }
            keys.push(key);
        }
        self.head.options.column_order = keys;
        self.touch();
        Ok(())
    }

    pub fn clear_column_order(&mut self) {
        self.head.options.column_order.clear();
        self.touch();
    }

    /// Hide a column. Returns `false` if it was already hidden.
    pub fn set_invisible_column(&mut self, key: &str) -> Result<bool> {
        validate_column_key(key)?;
        let added = self.head.options.invisible_columns.insert(key.to_string());
        if added {
            self.touch();
        }
        Ok(added)
    }

    /// Show a hidden column again. Returns `false` if it was not hidden.
    pub fn remove_invisible_column(&mut self, key: &str) -> bool {
        let removed = self.head.options.invisible_columns.remove(key);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear_invisible_columns(&mut self) {
        self.head.options.invisible_columns.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.head.updated_at = now();
    }
}

impl Deref for OptionsMut<'_> {
    type Target = Options;

    fn deref(&self) -> &Options {
        &self.head.options
    }
}
