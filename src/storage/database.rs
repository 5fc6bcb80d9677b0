//! Database: the table map and its persistence
//!
//! A [`Database`] exclusively owns its tables, keyed by case-sensitive
//! name. Persistence is one JSON document per database; indexes are never
//! written — a load replays every row through the normal insert path, so
//! indexes are rebuilt and constraints re-verified from scratch.

use crate::error::{EngineError, Result};
use crate::storage::table::{Column, Table};
use crate::value::{ColumnType, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// On-disk document shape. Unknown fields are rejected so that a file
/// from some other tool fails loudly instead of half-loading.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseDoc {
    tables: BTreeMap<String, TableDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDoc {
    columns: Vec<(String, ColumnType)>,
    primary_key: Option<String>,
    unique_columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct Database {
    /// BTreeMap keeps listing and file output deterministic.
    tables: BTreeMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly constructed table under its own name.
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(EngineError::TableExists(name));
        }
        self.tables.insert(name, table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize the whole database to `path`.
    ///
    /// The document is written to a sibling temporary file and renamed
    /// into place, so a concurrent reader sees either the prior snapshot
    /// or the new one, never a truncated prefix.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let doc = DatabaseDoc {
            tables: self
                .tables
                .iter()
                .map(|(name, table)| {
                    let table_doc = TableDoc {
                        columns: table
                            .columns()
                            .iter()
                            .map(|c| (c.name.clone(), c.column_type))
                            .collect(),
                        primary_key: table.primary_key().map(str::to_string),
                        unique_columns: table.unique_columns().to_vec(),
                        rows: table.rows().to_vec(),
                    };
                    (name.clone(), table_doc)
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;

        let dir = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| EngineError::Io(e.error))?;
        Ok(())
    }

    /// Restore a database from `path`.
    ///
    /// Each table is constructed empty and its rows re-inserted one by
    /// one, which rebuilds the indexes and re-verifies every constraint.
    /// Any decode or replay failure is a corrupt database.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::new());
        }

        let doc: DatabaseDoc = serde_json::from_str(&contents)
            .map_err(|e| EngineError::CorruptDatabase(e.to_string()))?;

        let mut database = Self::new();
        for (name, table_doc) in doc.tables {
            let columns = table_doc
                .columns
                .into_iter()
                .map(|(col_name, column_type)| Column::new(col_name, column_type))
                .collect();
            let mut table = Table::new(
                &name,
                columns,
                table_doc.primary_key,
                table_doc.unique_columns,
            )
            .map_err(|e| EngineError::CorruptDatabase(format!("table `{name}`: {e}")))?;

            for values in table_doc.rows {
                table
                    .insert_row(values)
                    .map_err(|e| EngineError::CorruptDatabase(format!("table `{name}`: {e}")))?;
            }
            database
                .create_table(table)
                .map_err(|e| EngineError::CorruptDatabase(e.to_string()))?;
        }
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::builder::DatabaseBuilder;

    fn sample() -> Database {
        DatabaseBuilder::new()
            .table("users", |t| {
                t.column("id", ColumnType::Integer)
                    .column("name", ColumnType::Text)
                    .column("score", ColumnType::Real)
                    .column("active", ColumnType::Boolean)
                    .primary_key("id")
                    .row(vec![
                        Value::Integer(1),
                        Value::Text("Alice".into()),
                        Value::Real(9.5),
                        Value::Boolean(true),
                    ])
                    .row(vec![
                        Value::Integer(2),
                        Value::Null,
                        Value::Real(4.0),
                        Value::Boolean(false),
                    ]);
            })
            .build()
    }

    #[test]
    fn test_create_table_rejects_name_clash() {
        let mut db = Database::new();
        let t = Table::new("t", vec![Column::new("x", ColumnType::Integer)], None, vec![]).unwrap();
        db.create_table(t).unwrap();
        assert!(db.has_table("t"));
        let t = Table::new("t", vec![Column::new("y", ColumnType::Text)], None, vec![]).unwrap();
        let err = db.create_table(t).unwrap_err();
        assert!(matches!(err, EngineError::TableExists(name) if name == "t"));
    }

    #[test]
    fn test_drop_unknown_table() {
        let mut db = Database::new();
        assert!(!db.has_table("ghost"));
        let err = db.drop_table("ghost").unwrap_err();
        assert!(matches!(err, EngineError::UnknownTable(name) if name == "ghost"));
    }

    #[test]
    fn test_drop_table_removes_it() {
        let mut db = sample();
        db.drop_table("users").unwrap();
        assert!(!db.has_table("users"));
        assert!(db.is_empty());
    }

    #[test]
    fn test_table_names_are_sorted() {
        let db = DatabaseBuilder::new()
            .table("zebra", |t| {
                t.column("x", ColumnType::Integer);
            })
            .table("apple", |t| {
                t.column("x", ColumnType::Integer);
            })
            .build();
        assert_eq!(db.table_names(), ["apple", "zebra"]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let db = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        db.save_to_file(&path).unwrap();

        let loaded = Database::load_from_file(&path).unwrap();
        assert_eq!(loaded.table_names(), ["users"]);
        let table = loaded.table("users").unwrap();
        assert_eq!(table.describe(), db.table("users").unwrap().describe());
        assert_eq!(table.rows(), db.table("users").unwrap().rows());
        // Indexes were rebuilt by replay.
        assert_eq!(table.index("id").unwrap().lookup(&Value::Integer(2)), &[1]);
    }

    #[test]
    fn test_saved_document_uses_native_scalars() {
        let db = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        db.save_to_file(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = &raw["tables"]["users"]["rows"];
        assert!(rows[0][0].is_i64());
        assert!(rows[0][2].is_f64());
        assert!(rows[0][3].is_boolean());
        assert!(rows[1][1].is_null());
        assert_eq!(raw["tables"]["users"]["columns"][0][1], "INTEGER");
        assert_eq!(raw["tables"]["users"]["primary_key"], "id");
    }

    #[test]
    fn test_load_empty_file_is_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        std::fs::write(&path, "").unwrap();
        let db = Database::load_from_file(&path).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_load_empty_tables_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        std::fs::write(&path, r#"{"tables": {}}"#).unwrap();
        let db = Database::load_from_file(&path).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_load_rejects_unknown_top_level_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        std::fs::write(&path, r#"{"tables": {}, "version": 2}"#).unwrap();
        let err = Database::load_from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::CorruptDatabase(_)));
    }

    #[test]
    fn test_load_rejects_missing_tables_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        std::fs::write(&path, r#"{"nope": 1}"#).unwrap();
        let err = Database::load_from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::CorruptDatabase(_)));
    }

    #[test]
    fn test_load_rejects_constraint_violation_in_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        std::fs::write(
            &path,
            r#"{"tables": {"t": {
                "columns": [["id", "INTEGER"]],
                "primary_key": "id",
                "unique_columns": [],
                "rows": [[1], [1]]
            }}}"#,
        )
        .unwrap();
        let err = Database::load_from_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::CorruptDatabase(msg) if msg.contains("unique")));
    }

    #[test]
    fn test_save_overwrites_atomically() {
        let db = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.josedb");
        db.save_to_file(&path).unwrap();
        db.save_to_file(&path).unwrap();
        // No stray temp files left behind.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
