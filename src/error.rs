//! Engine error taxonomy
//!
//! Every failure in the engine surfaces synchronously as a single
//! [`EngineError`] value. Nothing is retried and nothing is logged by the
//! core; callers decide how to report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed query text.
    #[error("parse error: {0}")]
    Parse(String),

    /// A statement referenced a table that does not exist.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// A projection, predicate, or assignment referenced a column that does
    /// not exist on the table(s) in scope.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// A bare column name in a join resolves to both sides.
    #[error("ambiguous column `{0}`")]
    AmbiguousColumn(String),

    /// CREATE TABLE with the same column name twice.
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    /// CREATE TABLE with a name that is already taken.
    #[error("table `{0}` already exists")]
    TableExists(String),

    /// INSERT with the wrong number of values.
    #[error("expected {expected} values, got {got}")]
    SchemaMismatch { expected: usize, got: usize },

    /// A primary-key or UNIQUE collision.
    #[error("unique violation on column `{0}`")]
    UniqueViolation(String),

    /// The persistence file cannot be decoded, or replaying its rows
    /// violates a constraint.
    #[error("corrupt database: {0}")]
    CorruptDatabase(String),

    /// Underlying file read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
