//! Command execution and auto-persistence
//!
//! The [`Executor`] is the engine's public face: it parses statement text,
//! dispatches the resulting command to the database and table operations,
//! and re-serializes the database after every successful mutation when a
//! file path is configured. A persistence failure surfaces to the caller
//! and does not roll back the in-memory mutation.

use crate::error::{EngineError, Result};
use crate::parser::command::{ColumnRef, Command, CreateTable, Join, Select};
use crate::parser::sql;
use crate::storage::database::Database;
use crate::storage::table::{Column, ResultRow, Table, TableInfo};
use std::path::PathBuf;

/// What a successfully executed statement hands back: result rows for
/// SELECT, a one-line status for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    Rows(Vec<ResultRow>),
    Status(String),
}

/// Which join table a resolved ON-clause reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinSide {
    Left,
    Right,
}

#[derive(Debug)]
pub struct Executor {
    database: Database,
    path: Option<PathBuf>,
    closed: bool,
}

impl Executor {
    /// Open a database. With a path, an existing file is loaded (and
    /// replay-verified); a missing file starts empty and is created on the
    /// first mutation. With no path the database lives in memory only.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let database = match &path {
            Some(p) if p.exists() => Database::load_from_file(p)?,
            _ => Database::new(),
        };
        Ok(Self {
            database,
            path,
            closed: false,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            database: Database::new(),
            path: None,
            closed: false,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Parse and run one statement.
    pub fn execute(&mut self, text: &str) -> Result<ExecOutcome> {
        let command = sql::parse_statement(text)?;

        let (outcome, mutated) = match command {
            Command::CreateTable(ct) => {
                let name = ct.name.clone();
                self.database.create_table(build_table(ct)?)?;
                (ExecOutcome::Status(format!("table `{name}` created")), true)
            }
            Command::DropTable(dt) => {
                self.database.drop_table(&dt.name)?;
                (
                    ExecOutcome::Status(format!("table `{}` dropped", dt.name)),
                    true,
                )
            }
            Command::Insert(insert) => {
                self.database
                    .table_mut(&insert.table)?
                    .insert_row(insert.values)?;
                (ExecOutcome::Status("1 row inserted".to_string()), true)
            }
            Command::Update(update) => {
                let count = self
                    .database
                    .table_mut(&update.table)?
                    .update(&update.assignments, &update.filter)?;
                (ExecOutcome::Status(count_status(count, "updated")), true)
            }
            Command::Delete(delete) => {
                let count = self
                    .database
                    .table_mut(&delete.table)?
                    .delete(&delete.filter)?;
                (ExecOutcome::Status(count_status(count, "deleted")), true)
            }
            Command::Select(select) => (ExecOutcome::Rows(self.run_select(select)?), false),
        };

        if mutated && let Some(path) = &self.path {
            self.database.save_to_file(path)?;
        }
        Ok(outcome)
    }

    fn run_select(&self, select: Select) -> Result<Vec<ResultRow>> {
        let table = self.database.table(&select.table)?;
        match &select.join {
            None => table.select(select.projection.as_deref(), &select.filter),
            Some(join) => {
                let other = self.database.table(&join.table)?;
                let (left_column, right_column) = resolve_join_sides(table, other, join)?;
                table.inner_join(
                    other,
                    &left_column,
                    &right_column,
                    select.projection.as_deref(),
                    &select.filter,
                )
            }
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.database.table_names()
    }

    pub fn describe(&self, name: &str) -> Result<TableInfo> {
        Ok(self.database.table(name)?.describe())
    }

    /// Flush a final save and mark the executor closed. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if let Some(path) = &self.path {
            self.database.save_to_file(path)?;
        }
        self.closed = true;
        Ok(())
    }
}

fn count_status(count: usize, verb: &str) -> String {
    if count == 1 {
        format!("1 row {verb}")
    } else {
        format!("{count} rows {verb}")
    }
}

fn build_table(ct: CreateTable) -> Result<Table> {
    let columns = ct
        .columns
        .into_iter()
        .map(|c| Column::new(c.name, c.column_type))
        .collect();
    Table::new(ct.name, columns, ct.primary_key, ct.unique_columns)
}

/// Decide which ON-clause reference binds to the left table and which to
/// the right. Either source order is accepted; each side must land on a
/// different table.
fn resolve_join_sides(left: &Table, right: &Table, join: &Join) -> Result<(String, String)> {
    let first = join_side(left, right, &join.on_first)?;
    let second = join_side(left, right, &join.on_second)?;
    match (first, second) {
        (JoinSide::Left, JoinSide::Right) => {
            Ok((join.on_first.name.clone(), join.on_second.name.clone()))
        }
        (JoinSide::Right, JoinSide::Left) => {
            Ok((join.on_second.name.clone(), join.on_first.name.clone()))
        }
        // Both references landed on one table; the other table's join
        // column is missing.
        (JoinSide::Left, JoinSide::Left) => {
            Err(EngineError::UnknownColumn(join.on_second.to_string()))
        }
        (JoinSide::Right, JoinSide::Right) => {
            Err(EngineError::UnknownColumn(join.on_first.to_string()))
        }
    }
}

fn join_side(left: &Table, right: &Table, colref: &ColumnRef) -> Result<JoinSide> {
    match &colref.table {
        Some(table) if table == left.name() => {
            if left.has_column(&colref.name) {
                Ok(JoinSide::Left)
            } else {
                Err(EngineError::UnknownColumn(colref.to_string()))
            }
        }
        Some(table) if table == right.name() => {
            if right.has_column(&colref.name) {
                Ok(JoinSide::Right)
            } else {
                Err(EngineError::UnknownColumn(colref.to_string()))
            }
        }
        Some(_) => Err(EngineError::UnknownColumn(colref.to_string())),
        None => match (left.has_column(&colref.name), right.has_column(&colref.name)) {
            (true, true) => Err(EngineError::AmbiguousColumn(colref.name.clone())),
            (true, false) => Ok(JoinSide::Left),
            (false, true) => Ok(JoinSide::Right),
            (false, false) => Err(EngineError::UnknownColumn(colref.name.clone())),
        },
    }
}
