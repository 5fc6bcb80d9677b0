//! Values and declared column types
//!
//! [`Value`] is the single runtime representation for everything a cell can
//! hold. [`ColumnType`] is the declared type recorded in the schema; it is
//! advisory only — the engine never coerces a stored `Value` to match it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// A single cell value.
///
/// Serialization uses the persistence format's native scalars: JSON
/// numbers for `Integer`/`Real`, strings for `Text`, booleans for
/// `Boolean`, and `null` for `Null`. The untagged representation relies on
/// serde_json distinguishing integer from float syntax, so `2` loads as
/// `Integer(2)` and `2.0` as `Real(2.0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Values compare by variant, then by content. Two values of different
/// variants are never equal. `Real` compares by IEEE-754 bit pattern so
/// that equality stays reflexive and consistent with [`Hash`] — a `Value`
/// has to be able to key a hash index.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Declared column type. Advisory: recorded in the schema and reported by
/// `describe`, never enforced on stored values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
}
