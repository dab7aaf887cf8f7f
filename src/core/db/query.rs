/// Statement Building Module
///
/// Builds the parameterized SQL behind `select`, `insert` and `update`.
/// Identifiers are backtick-quoted, which MySQL, MariaDB and SQLite all
/// accept; values are never interpolated and are bound positionally.

use crate::core::value::{Pair, Value};

/// A SQL string together with the values for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// A statement with no bound parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Quotes an identifier with backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `SELECT * FROM table WHERE where_column = ?`
pub fn build_select(table: &str, where_column: &str, selector: Value) -> Statement {
    Statement {
        sql: format!(
            "SELECT * FROM {} WHERE {} = ?",
            quote_identifier(table),
            quote_identifier(where_column)
        ),
        params: vec![selector],
    }
}

/// `INSERT INTO table (k1,k2,...) VALUES (?,?,...)`, values bound in key order.
pub fn build_insert(table: &str, pairs: &[Pair]) -> Statement {
    let keys = pairs
        .iter()
        .map(|pair| quote_identifier(&pair.key))
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = vec!["?"; pairs.len()].join(",");

    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            keys,
            placeholders
        ),
        params: pairs.iter().map(|pair| pair.value.clone()).collect(),
    }
}

/// `UPDATE table SET k1 = ?, k2 = ? WHERE where_column = ?`
///
/// Pair values are bound first in order, the selector last.
pub fn build_update(table: &str, where_column: &str, selector: Value, pairs: &[Pair]) -> Statement {
    let assignments = pairs
        .iter()
        .map(|pair| format!("{} = ?", quote_identifier(&pair.key)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params: Vec<Value> = pairs.iter().map(|pair| pair.value.clone()).collect();
    params.push(selector);

    Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_identifier(table),
            assignments,
            quote_identifier(where_column)
        ),
        params,
    }
}
