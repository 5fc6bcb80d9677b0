//! Command records produced by the parser
//!
//! The command layer decouples the parser from the execution engine. Each
//! variant carries only the fields the executor needs — there is no
//! general expression tree, because the query language has none.

use crate::value::{ColumnType, Value};
use std::fmt;

/// A parsed statement mapped to a high-level operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable(CreateTable),
    DropTable(DropTable),
    Insert(Insert),
    Select(Select),
    Update(Update),
    Delete(Delete),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<String>,
    pub unique_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    /// `None` means `*`.
    pub projection: Option<Vec<ColumnRef>>,
    pub join: Option<Join>,
    /// Conjunction of equality predicates; empty means match-all.
    pub filter: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: String,
    /// The two sides of the ON clause, in source order. Which one binds to
    /// the left table is resolved by the executor, not the parser.
    pub on_first: ColumnRef,
    pub on_second: ColumnRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    /// `SET col = literal` pairs, in source order.
    pub assignments: Vec<(String, Value)>,
    pub filter: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filter: Vec<Predicate>,
}

/// A single `colref = literal` equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: ColumnRef,
    pub value: Value,
}

/// A column reference, optionally qualified with a table name.
/// The qualified form is accepted everywhere a column may appear.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
