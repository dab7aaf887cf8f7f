//! Property-based tests for statement building
//!
//! These tests verify that the generated SQL and its bound parameters always
//! line up:
//! - INSERT has one column and one placeholder per pair, values in key order
//! - UPDATE binds pair values first and the selector last
//! - Identifier quoting never lets a name escape its backticks

#[cfg(test)]
mod tests {
    use dbapi::core::db::{build_insert, build_select, build_update, quote_identifier};
    use dbapi::{Pair, Value};
    use proptest::prelude::*;

    fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,20}"
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e9f64..1.0e9).prop_map(Value::Real),
            "[ -~]{0,16}".prop_map(Value::Text),
            proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Blob),
        ]
    }

    fn arb_pairs() -> impl Strategy<Value = Vec<Pair>> {
        proptest::collection::vec(
            (arb_identifier(), arb_value()).prop_map(|(k, v)| Pair::new(k, v)),
            1..12,
        )
    }

    proptest! {
        #[test]
        fn insert_has_one_placeholder_per_pair(table in arb_identifier(), pairs in arb_pairs()) {
            let stmt = build_insert(&table, &pairs);

            prop_assert_eq!(stmt.placeholder_count(), pairs.len());
            prop_assert_eq!(stmt.params.len(), pairs.len());

            let columns_start = stmt.sql.find('(').unwrap() + 1;
            let columns_end = stmt.sql.find(')').unwrap();
            let columns: Vec<&str> = stmt.sql[columns_start..columns_end].split(',').collect();
            prop_assert_eq!(columns.len(), pairs.len());

            for (i, pair) in pairs.iter().enumerate() {
                prop_assert_eq!(columns[i], quote_identifier(&pair.key));
                prop_assert_eq!(&stmt.params[i], &pair.value);
            }
        }

        #[test]
        fn update_binds_selector_last(
            table in arb_identifier(),
            where_column in arb_identifier(),
            selector in arb_value(),
            pairs in arb_pairs(),
        ) {
            let stmt = build_update(&table, &where_column, selector.clone(), &pairs);

            prop_assert_eq!(stmt.placeholder_count(), pairs.len() + 1);
            prop_assert_eq!(stmt.params.len(), pairs.len() + 1);
            prop_assert_eq!(stmt.params.last().unwrap(), &selector);
            for (i, pair) in pairs.iter().enumerate() {
                prop_assert_eq!(&stmt.params[i], &pair.value);
            }

            let expected_where = format!(" WHERE {} = ?", quote_identifier(&where_column));
            prop_assert!(stmt.sql.ends_with(&expected_where));
        }

        #[test]
        fn select_binds_only_selector(
            table in arb_identifier(),
            where_column in arb_identifier(),
            selector in arb_value(),
        ) {
            let stmt = build_select(&table, &where_column, selector.clone());
            prop_assert_eq!(stmt.placeholder_count(), 1);
            prop_assert_eq!(stmt.params, vec![selector]);
        }

        #[test]
        fn quoted_identifier_stays_enclosed(name in "[ -~]{0,24}") {
            let quoted = quote_identifier(&name);
            prop_assert!(quoted.starts_with('`') && quoted.ends_with('`'));

            let inner = &quoted[1..quoted.len() - 1];
            // Every backtick inside comes in an escaped pair
            prop_assert_eq!(inner.replace("``", ""), name.replace('`', ""));
        }
    }
}
