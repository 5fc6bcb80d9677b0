//! Property-based tests for the engine's core invariants.

use josedb::parser::command::{ColumnRef, Predicate};
use josedb::storage::{Column, Database, Table};
use josedb::value::{ColumnType, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn int(i: i64) -> Value {
    Value::Integer(i)
}

fn pred(column: &str, value: Value) -> Predicate {
    Predicate {
        column: ColumnRef::bare(column),
        value,
    }
}

/// Any cell value. Reals stay finite so the JSON document stays encodable.
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e12..1.0e12f64).prop_map(Value::Real),
        "[a-zA-Z0-9_ ]{0,12}".prop_map(Value::Text),
    ]
}

/// A `users(id INTEGER PRIMARY KEY, payload ...)` table with unique ids.
fn keyed_rows() -> impl Strategy<Value = BTreeMap<i64, Value>> {
    prop::collection::btree_map(any::<i64>(), value_strategy(), 0..16)
}

fn build_keyed_table(rows: &BTreeMap<i64, Value>) -> Table {
    let mut table = Table::new(
        "users",
        vec![
            Column::new("id", ColumnType::Integer),
            Column::new("payload", ColumnType::Text),
        ],
        Some("id".to_string()),
        vec![],
    )
    .expect("valid schema");
    for (id, payload) in rows {
        table
            .insert_row(vec![int(*id), payload.clone()])
            .expect("unique ids cannot collide");
    }
    table
}

proptest! {
    /// Save then load preserves schemas, row multisets, and index answers.
    #[test]
    fn round_trip_preserves_database(rows in keyed_rows()) {
        let mut database = Database::new();
        database.create_table(build_keyed_table(&rows)).expect("fresh name");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.josedb");
        database.save_to_file(&path).expect("save");
        let restored = Database::load_from_file(&path).expect("load");

        prop_assert_eq!(restored.table_names(), database.table_names());
        let before = database.table("users").expect("table");
        let after = restored.table("users").expect("table");
        prop_assert_eq!(before.describe(), after.describe());
        prop_assert_eq!(before.rows(), after.rows());
        for id in rows.keys() {
            prop_assert_eq!(
                before.index("id").expect("index").lookup(&int(*id)),
                after.index("id").expect("index").lookup(&int(*id))
            );
        }
    }

    /// After an insert, selecting by the constrained column finds the row.
    #[test]
    fn insert_then_select_finds_the_row(rows in keyed_rows(), extra in any::<i64>(), payload in value_strategy()) {
        prop_assume!(!rows.contains_key(&extra));
        let mut table = build_keyed_table(&rows);
        table.insert_row(vec![int(extra), payload.clone()]).expect("fresh id");

        let found = table
            .select(None, &[pred("id", int(extra))])
            .expect("select");
        prop_assert_eq!(found.len(), 1);
        prop_assert_eq!(found[0].get("id"), Some(&int(extra)));
        prop_assert_eq!(found[0].get("payload"), Some(&payload));
    }

    /// The second identical DELETE removes nothing and changes nothing.
    #[test]
    fn delete_is_idempotent_beyond_the_first(rows in keyed_rows(), target in any::<i64>()) {
        let mut table = build_keyed_table(&rows);
        let first = table.delete(&[pred("id", int(target))]).expect("delete");
        prop_assert!(first <= 1);

        let snapshot = table.rows().to_vec();
        let second = table.delete(&[pred("id", int(target))]).expect("delete");
        prop_assert_eq!(second, 0);
        prop_assert_eq!(table.rows(), snapshot.as_slice());
    }

    /// Writing a row's current key back to itself is a no-op.
    #[test]
    fn update_to_same_value_is_identity(rows in keyed_rows()) {
        let mut table = build_keyed_table(&rows);
        let snapshot = table.rows().to_vec();

        for id in rows.keys() {
            let n = table
                .update(
                    &[("id".to_string(), int(*id))],
                    &[pred("id", int(*id))],
                )
                .expect("identity update");
            prop_assert_eq!(n, 1);
        }

        prop_assert_eq!(table.rows(), snapshot.as_slice());
        for id in rows.keys() {
            let ids = table.index("id").expect("index").lookup(&int(*id));
            prop_assert_eq!(ids.len(), 1);
            prop_assert_eq!(&table.rows()[ids[0]][0], &int(*id));
        }
    }

    /// With no Nulls in the join columns, joining either way around
    /// produces the same number of rows with the same contents.
    #[test]
    fn join_size_is_symmetric(
        left_values in prop::collection::vec(0..6i64, 0..12),
        right_values in prop::collection::vec(0..6i64, 0..12),
    ) {
        let mut left = Table::new("a", vec![Column::new("x", ColumnType::Integer)], None, vec![])
            .expect("schema");
        for v in &left_values {
            left.insert_row(vec![int(*v)]).expect("insert");
        }
        let mut right = Table::new("b", vec![Column::new("y", ColumnType::Integer)], None, vec![])
            .expect("schema");
        for v in &right_values {
            right.insert_row(vec![int(*v)]).expect("insert");
        }

        let forward = left.inner_join(&right, "x", "y", None, &[]).expect("join");
        let backward = right.inner_join(&left, "y", "x", None, &[]).expect("join");
        prop_assert_eq!(forward.len(), backward.len());

        // Pairwise content equality modulo key renaming: compare the
        // multiset of (left value, right value) pairs.
        let mut forward_pairs: Vec<(Value, Value)> = forward
            .iter()
            .map(|r| (r.get("a.x").expect("a.x").clone(), r.get("b.y").expect("b.y").clone()))
            .collect();
        let mut backward_pairs: Vec<(Value, Value)> = backward
            .iter()
            .map(|r| (r.get("a.x").expect("a.x").clone(), r.get("b.y").expect("b.y").clone()))
            .collect();
        let key = |v: &Value| match v {
            Value::Integer(i) => *i,
            _ => unreachable!("join columns are integers"),
        };
        forward_pairs.sort_by_key(|(a, b)| (key(a), key(b)));
        backward_pairs.sort_by_key(|(a, b)| (key(a), key(b)));
        prop_assert_eq!(forward_pairs, backward_pairs);
    }

    /// No sequence of inserts, deletes, and updates can leave two rows
    /// sharing a non-Null value in a UNIQUE column, and the index always
    /// mirrors the rows.
    #[test]
    fn uniqueness_survives_arbitrary_operations(
        ops in prop::collection::vec((0..3u8, 0..8i64, 0..8i64), 0..40),
    ) {
        let mut table = Table::new(
            "t",
            vec![Column::new("x", ColumnType::Integer)],
            None,
            vec!["x".to_string()],
        )
        .expect("schema");

        for (op, a, b) in ops {
            let a_value = if a == 7 { Value::Null } else { int(a) };
            // Errors are part of normal operation here; the invariant must
            // hold regardless of which operations succeeded.
            let _ = match op {
                0 => table.insert_row(vec![a_value]).map(|_| 0),
                1 => table.delete(&[pred("x", a_value)]),
                _ => table.update(&[("x".to_string(), int(b))], &[pred("x", a_value)]),
            };
        }

        let mut seen = std::collections::HashSet::new();
        for (i, row) in table.rows().iter().enumerate() {
            let value = &row[0];
            if !value.is_null() {
                prop_assert!(
                    seen.insert(value.clone()),
                    "duplicate non-Null value {value} in a UNIQUE column"
                );
                let ids = table.index("x").expect("index").lookup(value);
                prop_assert_eq!(ids, &[i], "index entry must point at the row holding the value");
            }
        }
    }
}
