//! The document body: tables plus their serial counters.

use std::collections::HashSet;
use std::ops::Deref;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::table::{Table, TableMut};
use super::{now, Document};
use crate::error::{HplError, Result};

pub const TABLE_ID_PREFIX: &str = "TBL-";

const TABLE_ID_MIN: u16 = 1000;
const TABLE_ID_MAX: u16 = 9999;

/// Random draws before falling back to picking among the free ids.
const RANDOM_ID_ATTEMPTS: usize = 64;

/// Serial counter of one table: the last serial number handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceEntry {
    pub(crate) table_id: String,
    pub(crate) counter: u64,
}

impl SequenceEntry {
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Body {
    pub(crate) sequence: Vec<SequenceEntry>,
    pub(crate) tables: Vec<Table>,
}

impl Body {
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn sequence(&self) -> &[SequenceEntry] {
        &self.sequence
    }

    pub fn sequence_counter(&self, table_id: &str) -> Option<u64> {
        self.sequence
            .iter()
            .find(|e| e.table_id == table_id)
            .map(|e| e.counter)
    }

    pub(crate) fn table_index(&self, table_id: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.id == table_id)
    }
}

/// Mutable lens over the body.
pub struct BodyMut<'a> {
    doc: &'a mut Document,
}

impl<'a> BodyMut<'a> {
    pub(crate) fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    pub fn table_mut(&mut self, table_id: &str) -> Option<TableMut<'_>> {
        let index = self.doc.body.table_index(table_id)?;
        Some(TableMut::new(self.doc, index))
    }

    pub fn into_table_mut(self, table_id: &str) -> Option<TableMut<'a>> {
        let index = self.doc.body.table_index(table_id)?;
        Some(TableMut::new(self.doc, index))
    }

    /// Create an empty table with a fresh `TBL-dddd` id and a zero counter.
    ///
    /// # Errors
    ///
    /// Returns `HplError::Validation` when every id in the space is taken.
    pub fn add_table(&mut self, name: &str, summary: &str) -> Result<TableMut<'_>> {
        let index = self.push_table(name, summary)?;
        Ok(TableMut::new(self.doc, index))
    }

    /// Consuming form of [`BodyMut::add_table`].
    pub fn into_added_table(mut self, name: &str, summary: &str) -> Result<TableMut<'a>> {
        let index = self.push_table(name, summary)?;
        Ok(TableMut::new(self.doc, index))
    }

    /// Remove a table together with its serial counter.
    pub fn remove_table(&mut self, table_id: &str) -> Option<Table> {
        let index = self.doc.body.table_index(table_id)?;
        let body = &mut self.doc.body;
        let table = body.tables.remove(index);
        body.sequence.retain(|e| e.table_id != table_id);
        self.doc.touch(now());
        Some(table)
    }

    fn push_table(&mut self, name: &str, summary: &str) -> Result<usize> {
        let id = generate_table_id(&self.doc.body.tables, &mut rand::thread_rng())?;
        let at = now();
        let body = &mut self.doc.body;
        body.sequence.push(SequenceEntry {
            table_id: id.clone(),
            counter: 0,
        });
        body.tables.push(Table::new(id, name, summary, at));
        let index = body.tables.len() - 1;
        self.doc.touch(at);
        Ok(index)
    }
}

impl Deref for BodyMut<'_> {
    type Target = Body;

    fn deref(&self) -> &Body {
        &self.doc.body
    }
}

fn format_table_id(number: u16) -> String {
    format!("{}{}", TABLE_ID_PREFIX, number)
}

/// Draw a random unused table id.
///
/// Random draws almost always succeed at once; when the id space is nearly
/// full the free ids are enumerated so the search still terminates.
fn generate_table_id<R: Rng>(existing: &[Table], rng: &mut R) -> Result<String> {
    let taken: HashSet<&str> = existing.iter().map(|t| t.id.as_str()).collect();

    for _ in 0..RANDOM_ID_ATTEMPTS {
        let candidate = format_table_id(rng.gen_range(TABLE_ID_MIN..=TABLE_ID_MAX));
        if !taken.contains(candidate.as_str()) {
            return Ok(candidate);
        }
    }

    let free: Vec<String> = (TABLE_ID_MIN..=TABLE_ID_MAX)
        .map(format_table_id)
        .filter(|id| !taken.contains(id.as_str()))
        .collect();
    free.choose(rng)
        .cloned()
        .ok_or_else(|| HplError::Validation("No free table id left in this document".to_string()))
}
