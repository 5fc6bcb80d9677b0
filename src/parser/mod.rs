//! Query parsing and command generation

pub mod command;
pub(crate) mod sql;

pub use command::{
    ColumnDef, ColumnRef, Command, CreateTable, Delete, DropTable, Insert, Join, Predicate,
    Select, Update,
};
pub use sql::parse_statement;
