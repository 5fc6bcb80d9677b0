//! Hash index over a single column
//!
//! A multimap from a column value to the set of row ids holding that value,
//! optionally constrained to at most one row per value. Null values are
//! never stored: they do not participate in uniqueness and a lookup on Null
//! always returns the empty set.

use crate::error::{EngineError, Result};
use crate::value::Value;
use std::collections::HashMap;

/// A row's position in its table's row vector at the moment of reference.
/// Not stable across deletes.
pub type RowId = usize;

#[derive(Debug, Clone)]
pub struct Index {
    /// Name of the indexed column, for error reporting.
    column: String,
    unique: bool,
    entries: HashMap<Value, Vec<RowId>>,
}

impl Index {
    pub fn new(column: impl Into<String>, unique: bool) -> Self {
        Self {
            column: column.into(),
            unique,
            entries: HashMap::new(),
        }
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Add an entry. Null values are silently skipped.
    pub fn insert(&mut self, value: &Value, id: RowId) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let ids = self.entries.entry(value.clone()).or_default();
        if self.unique && !ids.is_empty() {
            return Err(EngineError::UniqueViolation(self.column.clone()));
        }
        ids.push(id);
        Ok(())
    }

    /// Row ids mapped from `value`. Empty for Null and for absent values.
    /// The returned ids are in insertion order, not necessarily sorted.
    pub fn lookup(&self, value: &Value) -> &[RowId] {
        self.entries
            .get(value)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, value: &Value) -> bool {
        !self.lookup(value).is_empty()
    }

    /// Remove the entry `(value, id)`, pruning the key once no id maps
    /// from it. Removing an absent entry is a no-op.
    pub fn remove(&mut self, value: &Value, id: RowId) {
        if let Some(ids) = self.entries.get_mut(value) {
            ids.retain(|&existing| existing != id);
            if ids.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    /// Discard all state and re-insert `entries` in order.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (Value, RowId)>) -> Result<()> {
        self.entries.clear();
        for (value, id) in entries {
            self.insert(&value, id)?;
        }
        Ok(())
    }

    /// Decrement every stored row id greater than `removed`. Called after
    /// a row-vector removal shifts the positions of all later rows.
    pub fn shift_after_removal(&mut self, removed: RowId) {
        for ids in self.entries.values_mut() {
            for id in ids.iter_mut() {
                if *id > removed {
                    *id -= 1;
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
