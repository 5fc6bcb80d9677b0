//! Table storage and constraint enforcement
//!
//! A [`Table`] owns its schema, its row vector, and one hash [`Index`] per
//! constrained column (the primary key and every UNIQUE column). All
//! validation happens before any mutation, so a failed operation leaves
//! the table exactly as it was.

use crate::error::{EngineError, Result};
use crate::parser::command::{ColumnRef, Predicate};
use crate::storage::index::{Index, RowId};
use crate::value::{ColumnType, Value};
use std::collections::{HashMap, HashSet};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// An ordered tuple of values; its length always equals the owning
/// table's column count.
pub type Row = Vec<Value>;

/// A materialized result row: `(column name, value)` pairs in projection
/// order. Keys are bare column names for single-table results and
/// `table.col` qualified names for join results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow(Vec<(String, Value)>);

impl ResultRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, Value)>> for ResultRow {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self(pairs)
    }
}

impl<'a> IntoIterator for &'a ResultRow {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Schema summary returned by `describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub columns: Vec<(String, ColumnType)>,
    pub primary_key: Option<String>,
    pub unique_columns: Vec<String>,
}

/// Which side of a join a resolved column reference lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Build-phase lookup for the hash join: the right table's own index when
/// the join column is constrained, or a transient map built by one scan.
enum BuildMap<'a> {
    Index(&'a Index),
    Transient(HashMap<&'a Value, Vec<RowId>>),
}

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<String>,
    unique_columns: Vec<String>,
    rows: Vec<Row>,
    /// One index per constrained column, keyed by column name.
    indexes: HashMap<String, Index>,
    /// Column name to position, rebuilt from the column list.
    positions: HashMap<String, usize>,
}

impl Table {
    /// Construct an empty table. Fails on a duplicate column name, or on a
    /// primary key or unique column that is not in the column list.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Column>,
        primary_key: Option<String>,
        unique_columns: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();

        let mut positions = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            if positions.insert(column.name.clone(), i).is_some() {
                return Err(EngineError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(pk) = &primary_key
            && !positions.contains_key(pk)
        {
            return Err(EngineError::UnknownColumn(pk.clone()));
        }
        for column in &unique_columns {
            if !positions.contains_key(column) {
                return Err(EngineError::UnknownColumn(column.clone()));
            }
        }

        let mut indexes = HashMap::new();
        for column in primary_key.iter().chain(unique_columns.iter()) {
            indexes
                .entry(column.clone())
                .or_insert_with(|| Index::new(column.clone(), true));
        }

        Ok(Self {
            name,
            columns,
            primary_key,
            unique_columns,
            rows: Vec::new(),
            indexes,
            positions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn unique_columns(&self) -> &[String] {
        &self.unique_columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The index for a constrained column, `None` for everything else.
    pub fn index(&self, column: &str) -> Option<&Index> {
        self.indexes.get(column)
    }

    pub fn is_constrained(&self, column: &str) -> bool {
        self.indexes.contains_key(column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    pub fn describe(&self) -> TableInfo {
        TableInfo {
            columns: self
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.column_type))
                .collect(),
            primary_key: self.primary_key.clone(),
            unique_columns: self.unique_columns.clone(),
        }
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| EngineError::UnknownColumn(column.to_string()))
    }

    /// Resolve a possibly qualified reference against this table alone.
    /// A qualifier naming any other table is an unknown column here.
    fn resolve_ref(&self, column: &ColumnRef) -> Result<usize> {
        if let Some(table) = &column.table
            && *table != self.name
        {
            return Err(EngineError::UnknownColumn(column.to_string()));
        }
        self.position(&column.name)
    }

    /// Constrained column names in schema order, for deterministic error
    /// reporting.
    fn constrained_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| self.indexes.contains_key(*name))
    }

    /// Append a row. All constraint checks complete before the row vector
    /// or any index is touched.
    pub fn insert_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(EngineError::SchemaMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }

        for column in self.constrained_columns() {
            let pos = self.positions[column];
            let value = &values[pos];
            if !value.is_null() && self.indexes[column].contains(value) {
                return Err(EngineError::UniqueViolation(column.to_string()));
            }
        }

        let id = self.rows.len();
        self.rows.push(values);
        for (column, index) in self.indexes.iter_mut() {
            let pos = self.positions[column.as_str()];
            index.insert(&self.rows[id][pos], id)?;
        }
        Ok(())
    }

    /// Row ids matching a conjunction of equality predicates, ascending.
    ///
    /// Predicates on constrained columns with non-Null values go through
    /// the index, smallest candidate set first; everything else scans.
    /// Null-valued predicates always scan, since Null is never indexed —
    /// and `c = null` does match Null rows in this engine.
    fn matching_rows(&self, filter: &[Predicate]) -> Result<Vec<RowId>> {
        let mut indexed: Vec<(&Index, &Value)> = Vec::new();
        let mut scanned: Vec<(usize, &Value)> = Vec::new();
        for predicate in filter {
            let pos = self.resolve_ref(&predicate.column)?;
            match self.indexes.get(&predicate.column.name) {
                Some(index) if !predicate.value.is_null() => {
                    indexed.push((index, &predicate.value));
                }
                _ => scanned.push((pos, &predicate.value)),
            }
        }

        let mut ids: Vec<RowId> = if indexed.is_empty() {
            (0..self.rows.len()).collect()
        } else {
            indexed.sort_by_key(|(index, value)| index.lookup(value).len());
            let (first_index, first_value) = indexed[0];
            let mut ids = first_index.lookup(first_value).to_vec();
            ids.sort_unstable();
            for (index, value) in &indexed[1..] {
                let others: HashSet<RowId> = index.lookup(value).iter().copied().collect();
                ids.retain(|id| others.contains(id));
            }
            ids
        };

        ids.retain(|&id| {
            scanned
                .iter()
                .all(|(pos, value)| &self.rows[id][*pos] == *value)
        });
        Ok(ids)
    }

    /// Equality-filtered read. Results are materialized copies in row-id
    /// order, projected to `projection` if supplied (`None` means all
    /// columns), keyed by bare column names.
    pub fn select(
        &self,
        projection: Option<&[ColumnRef]>,
        filter: &[Predicate],
    ) -> Result<Vec<ResultRow>> {
        let projected: Vec<(String, usize)> = match projection {
            Some(refs) => refs
                .iter()
                .map(|r| Ok((r.name.clone(), self.resolve_ref(r)?)))
                .collect::<Result<_>>()?,
            None => self
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.name.clone(), i))
                .collect(),
        };

        let ids = self.matching_rows(filter)?;
        Ok(ids
            .into_iter()
            .map(|id| {
                ResultRow::from(
                    projected
                        .iter()
                        .map(|(name, pos)| (name.clone(), self.rows[id][*pos].clone()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect())
    }

    /// Replace values in all matching rows. Returns the updated-row count.
    ///
    /// Index changes are simulated first: a new value for a constrained
    /// column must not collide with any row outside the matching set, and
    /// a non-Null value cannot be written to more than one matching row.
    /// On violation nothing has been mutated.
    pub fn update(&mut self, assignments: &[(String, Value)], filter: &[Predicate]) -> Result<usize> {
        let resolved: Vec<(usize, &str, &Value)> = assignments
            .iter()
            .map(|(column, value)| Ok((self.position(column)?, column.as_str(), value)))
            .collect::<Result<_>>()?;

        let matched = self.matching_rows(filter)?;
        let matched_set: HashSet<RowId> = matched.iter().copied().collect();

        for (_, column, value) in &resolved {
            let Some(index) = self.indexes.get(*column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if matched.len() > 1 {
                return Err(EngineError::UniqueViolation(column.to_string()));
            }
            if index.lookup(value).iter().any(|id| !matched_set.contains(id)) {
                return Err(EngineError::UniqueViolation(column.to_string()));
            }
        }

        for &id in &matched {
            for (pos, column, value) in &resolved {
                if let Some(index) = self.indexes.get_mut(*column) {
                    let old = self.rows[id][*pos].clone();
                    if !old.is_null() {
                        index.remove(&old, id);
                    }
                    self.rows[id][*pos] = (*value).clone();
                    if !value.is_null() {
                        index.insert(value, id)?;
                    }
                } else {
                    self.rows[id][*pos] = (*value).clone();
                }
            }
        }
        Ok(matched.len())
    }

    /// Remove all matching rows. Returns the removed-row count.
    ///
    /// Rows are removed in descending row-id order so the matching set
    /// stays valid throughout; each removal still shifts the surviving
    /// rows after it, so every index is fixed up as part of the same step.
    pub fn delete(&mut self, filter: &[Predicate]) -> Result<usize> {
        let matched = self.matching_rows(filter)?;

        for &id in matched.iter().rev() {
            for (column, index) in self.indexes.iter_mut() {
                let pos = self.positions[column.as_str()];
                let value = &self.rows[id][pos];
                if !value.is_null() {
                    index.remove(value, id);
                }
            }
            self.rows.remove(id);
            for index in self.indexes.values_mut() {
                index.shift_after_removal(id);
            }
        }
        Ok(matched.len())
    }

    /// Hash equi-join on one column pair, this table on the left.
    ///
    /// Build phase: the right table's index on `right_column` if one
    /// exists, otherwise a transient map from one scan; Null join values
    /// are excluded on both sides. Probe phase: left rows in row-id order,
    /// matched right rows in row-id order. The filter applies after
    /// joining; filter and projection references may be qualified or bare,
    /// with bare names resolved by ownership. Result keys are always
    /// qualified.
    pub fn inner_join(
        &self,
        other: &Table,
        left_column: &str,
        right_column: &str,
        projection: Option<&[ColumnRef]>,
        filter: &[Predicate],
    ) -> Result<Vec<ResultRow>> {
        let left_pos = self.position(left_column)?;
        let right_pos = other.position(right_column)?;

        let filter_resolved: Vec<(Side, usize, &Value)> = filter
            .iter()
            .map(|p| {
                let (side, pos) = self.resolve_join_ref(other, &p.column)?;
                Ok((side, pos, &p.value))
            })
            .collect::<Result<_>>()?;

        let projected: Vec<(String, Side, usize)> = match projection {
            Some(refs) => refs
                .iter()
                .map(|r| {
                    let (side, pos) = self.resolve_join_ref(other, r)?;
                    let table = match side {
                        Side::Left => &self.name,
                        Side::Right => &other.name,
                    };
                    Ok((format!("{}.{}", table, r.name), side, pos))
                })
                .collect::<Result<_>>()?,
            None => self
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("{}.{}", self.name, c.name), Side::Left, i))
                .chain(
                    other
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (format!("{}.{}", other.name, c.name), Side::Right, i)),
                )
                .collect(),
        };

        let build = match other.indexes.get(right_column) {
            Some(index) => BuildMap::Index(index),
            None => {
                let mut map: HashMap<&Value, Vec<RowId>> = HashMap::new();
                for (j, row) in other.rows.iter().enumerate() {
                    let value = &row[right_pos];
                    if !value.is_null() {
                        map.entry(value).or_default().push(j);
                    }
                }
                BuildMap::Transient(map)
            }
        };

        let mut results = Vec::new();
        for left_row in &self.rows {
            let value = &left_row[left_pos];
            if value.is_null() {
                continue;
            }
            let mut matches: Vec<RowId> = match &build {
                BuildMap::Index(index) => index.lookup(value).to_vec(),
                BuildMap::Transient(map) => map.get(value).cloned().unwrap_or_default(),
            };
            matches.sort_unstable();

            for j in matches {
                let right_row = &other.rows[j];
                let passes = filter_resolved.iter().all(|(side, pos, value)| {
                    let cell = match side {
                        Side::Left => &left_row[*pos],
                        Side::Right => &right_row[*pos],
                    };
                    cell == *value
                });
                if !passes {
                    continue;
                }
                results.push(ResultRow::from(
                    projected
                        .iter()
                        .map(|(key, side, pos)| {
                            let cell = match side {
                                Side::Left => &left_row[*pos],
                                Side::Right => &right_row[*pos],
                            };
                            (key.clone(), cell.clone())
                        })
                        .collect::<Vec<_>>(),
                ));
            }
        }
        Ok(results)
    }

    /// Resolve a join-scope reference to a side and column position.
    /// Bare names owned by both sides are ambiguous; names owned by
    /// neither, or qualified with a table that is not in the join, are
    /// unknown.
    fn resolve_join_ref(&self, other: &Table, column: &ColumnRef) -> Result<(Side, usize)> {
        match &column.table {
            Some(table) if *table == self.name => Ok((Side::Left, self.position(&column.name)?)),
            Some(table) if *table == other.name => Ok((Side::Right, other.position(&column.name)?)),
            Some(_) => Err(EngineError::UnknownColumn(column.to_string())),
            None => match (self.positions.get(&column.name), other.positions.get(&column.name)) {
                (Some(_), Some(_)) => Err(EngineError::AmbiguousColumn(column.name.clone())),
                (Some(&pos), None) => Ok((Side::Left, pos)),
                (None, Some(&pos)) => Ok((Side::Right, pos)),
                (None, None) => Err(EngineError::UnknownColumn(column.name.clone())),
            },
        }
    }
}
