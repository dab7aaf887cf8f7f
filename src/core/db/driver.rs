/// Driver Module
///
/// The seam between the façade and a concrete SQL driver. A driver owns one
/// live connection and executes already-built [`Statement`]s on it.

use crate::core::db::connection::{sqlite_path, MEMORY_PATH};
use crate::core::db::query::Statement;
use crate::core::value::Value;
use crate::core::{DbError, Result};
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, trace};

/// Rows returned by a statement, with their column names.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of data, one value per column
    pub rows: Vec<Vec<Value>>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new QueryResult from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
        }
    }
}

/// One open connection to a database.
///
/// Implementations block the calling thread for the duration of each call.
pub trait DriverConnection: Send {
    /// Executes a statement through the update path and returns the number of
    /// affected rows. Statements that produce rows fail with
    /// `DbError::ReturnedRows`.
    fn execute(&mut self, statement: &Statement) -> Result<usize>;

    /// Executes a statement and reads every row it returns.
    fn query(&mut self, statement: &Statement) -> Result<QueryResult>;

    /// Closes the connection.
    fn close(self: Box<Self>) -> Result<()>;
}

/// SQLite connection backed by rusqlite.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    /// Opens the database named by a `sqlite://` connection string.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` when the file cannot be opened.
    pub fn open(connection_string: &str) -> Result<Self> {
        let path = sqlite_path(connection_string);
        debug!("Opening SQLite database at {}", path);

        let conn = if path == MEMORY_PATH {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| DbError::Connection(e.to_string()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DbError::Connection(e.to_string()))?;

        Ok(SqliteDriver { conn })
    }
}

impl DriverConnection for SqliteDriver {
    fn execute(&mut self, statement: &Statement) -> Result<usize> {
        trace!("sqlite execute: {} {:?}", statement.sql, statement.params);
        let mut stmt = self.conn.prepare(&statement.sql)?;
        stmt.execute(params_from_iter(statement.params.iter()))
            .map_err(|e| match e {
                rusqlite::Error::ExecuteReturnedResults => DbError::ReturnedRows,
                e => DbError::Sqlite(e),
            })
    }

    fn query(&mut self, statement: &Statement) -> Result<QueryResult> {
        trace!("sqlite query: {} {:?}", statement.sql, statement.params);
        let mut stmt = self.conn.prepare(&statement.sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let rows = stmt
            .query_map(params_from_iter(statement.params.iter()), |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(QueryResult::new(columns, rows))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::query::{build_insert, build_select};
    use crate::core::value::Pair;

    fn memory_driver() -> SqliteDriver {
        let mut driver = SqliteDriver::open("sqlite::memory:").unwrap();
        driver
            .execute(&Statement::raw(
                "CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT, value REAL)",
            ))
            .unwrap();
        driver
    }

    #[test]
    fn test_execute_reports_affected_rows() {
        let mut driver = memory_driver();
        let inserted = driver
            .execute(&build_insert(
                "test",
                &[Pair::new("name", "Alice"), Pair::new("value", 1.5)],
            ))
            .unwrap();
        assert_eq!(inserted, 1);

        let updated = driver
            .execute(&Statement::raw("UPDATE test SET value = 2.0"))
            .unwrap();
        assert_eq!(updated, 1);
    }

    #[test]
    fn test_query_reads_columns_and_rows() {
        let mut driver = memory_driver();
        driver
            .execute(&build_insert("test", &[Pair::new("id", 1), Pair::new("name", "Alice")]))
            .unwrap();

        let result = driver
            .query(&build_select("test", "id", Value::Integer(1)))
            .unwrap();
        assert_eq!(result.columns, vec!["id", "name", "value"]);
        assert_eq!(result.row_count, 1);
        assert_eq!(
            result.rows[0],
            vec![Value::Integer(1), Value::Text("Alice".to_string()), Value::Null]
        );
    }

    #[test]
    fn test_execute_rejects_row_returning_statement() {
        let mut driver = memory_driver();
        let result = driver.execute(&Statement::raw("SELECT * FROM test"));
        assert!(matches!(result, Err(DbError::ReturnedRows)));
    }

    #[test]
    fn test_query_error_handling() {
        let mut driver = memory_driver();
        let result = driver.query(&Statement::raw("SELECT * FROM nonexistent_table"));
        match result {
            Err(DbError::Sqlite(e)) => assert!(e.to_string().contains("no such table")),
            other => panic!("Expected Sqlite error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_invalid_path() {
        let result = SqliteDriver::open("sqlite:///nonexistent/path/database.db");
        assert!(matches!(result, Err(DbError::Connection(_))));
    }

    #[test]
    fn test_close() {
        let driver: Box<dyn DriverConnection> = Box::new(memory_driver());
        assert!(driver.close().is_ok());
    }
}
