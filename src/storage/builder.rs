//! Test harness for building database state
//!
//! A fluent API for constructing tables and databases in tests. Goes
//! through the public constructors and `insert_row`, so everything built
//! here has passed the same validation as runtime data; builder misuse
//! panics with the underlying engine error.
//!
//! # Example
//!
//! ```rust
//! use josedb::storage::builder::DatabaseBuilder;
//! use josedb::value::{ColumnType, Value};
//!
//! let db = DatabaseBuilder::new()
//!     .table("users", |t| {
//!         t.column("id", ColumnType::Integer)
//!             .column("name", ColumnType::Text)
//!             .primary_key("id")
//!             .row(vec![Value::Integer(1), Value::Text("Alice".into())]);
//!     })
//!     .build();
//! ```

use crate::storage::database::Database;
use crate::storage::table::{Column, Table};
use crate::value::{ColumnType, Value};

/// Builder for constructing a Database in tests.
pub struct DatabaseBuilder {
    database: Database,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self {
            database: Database::new(),
        }
    }

    /// Add a table. The closure receives a TableBuilder to configure
    /// columns, constraints, and rows.
    pub fn table(mut self, name: &str, f: impl FnOnce(&mut TableBuilder)) -> Self {
        let mut builder = TableBuilder::new(name);
        f(&mut builder);
        self.database
            .create_table(builder.build())
            .unwrap_or_else(|e| panic!("builder: create table `{name}`: {e}"));
        self
    }

    pub fn build(self) -> Database {
        self.database
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a Table in tests.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<String>,
    unique_columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: vec![],
            primary_key: None,
            unique_columns: vec![],
            rows: vec![],
        }
    }

    pub fn column(&mut self, name: &str, column_type: ColumnType) -> &mut Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    pub fn primary_key(&mut self, column: &str) -> &mut Self {
        self.primary_key = Some(column.to_string());
        self
    }

    pub fn unique(&mut self, column: &str) -> &mut Self {
        self.unique_columns.push(column.to_string());
        self
    }

    pub fn row(&mut self, values: Vec<Value>) -> &mut Self {
        self.rows.push(values);
        self
    }

    pub fn build(self) -> Table {
        let name = self.name;
        let mut table = Table::new(&name, self.columns, self.primary_key, self.unique_columns)
            .unwrap_or_else(|e| panic!("builder: table `{name}`: {e}"));
        for values in self.rows {
            table
                .insert_row(values)
                .unwrap_or_else(|e| panic!("builder: insert into `{name}`: {e}"));
        }
        table
    }
}
