/// MySQL Driver Module
///
/// MySQL and MariaDB connections over the sqlx wire driver. sqlx is async, so
/// each connection carries its own current-thread tokio runtime and every call
/// blocks on it; callers must not already be inside a tokio runtime.

use crate::core::db::driver::{DriverConnection, QueryResult};
use crate::core::db::query::Statement;
use crate::core::value::Value;
use crate::core::{DbError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt as _;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlRow, MySqlValueRef};
use sqlx::query::Query;
use sqlx::{Column as _, ConnectOptions as _, Connection as _, Either, Executor as _, MySql};
use sqlx::{Row as _, TypeInfo as _};
use sqlx::{Value as _, ValueRef as _};
use tokio::runtime::Runtime;
use tracing::{debug, trace};
use url::Url;

/// A MySQL-protocol connection and the runtime that drives it.
///
/// `conn` is declared first so it is dropped while the runtime still exists.
pub struct MySqlDriver {
    conn: sqlx::MySqlConnection,
    runtime: Runtime,
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver").finish_non_exhaustive()
    }
}

impl MySqlDriver {
    /// Connects using a `scheme://host:port/database?user=U&password=P` string.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` for an unparsable string or a failed
    /// handshake, `DbError::Runtime` if the runtime cannot be built.
    pub fn open(connection_string: &str) -> Result<Self> {
        let options = connect_options(connection_string)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::Runtime(e.to_string()))?;

        debug!("Connecting to MySQL server");
        let conn = runtime
            .block_on(options.connect())
            .map_err(|e| DbError::Connection(e.to_string()))?;

        Ok(MySqlDriver { conn, runtime })
    }
}

/// Builds sqlx options from a connection string, taking the credentials from
/// the `user` and `password` query parameters.
pub(crate) fn connect_options(connection_string: &str) -> Result<MySqlConnectOptions> {
    let url = Url::parse(connection_string)
        .map_err(|e| DbError::Connection(format!("Invalid connection string: {}", e)))?;

    let mut base = url.clone();
    base.set_query(None);
    let mut options =
        MySqlConnectOptions::from_url(&base).map_err(|e| DbError::Connection(e.to_string()))?;

    let (user, password) = credentials(&url);
    if let Some(user) = user {
        options = options.username(&user);
    }
    if let Some(password) = password {
        options = options.password(&password);
    }

    Ok(options)
}

/// Reads the form-encoded `user` and `password` query parameters.
fn credentials(url: &Url) -> (Option<String>, Option<String>) {
    let mut user = None;
    let mut password = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "user" => user = Some(value.into_owned()),
            "password" => password = Some(value.into_owned()),
            _ => {}
        }
    }
    (user, password)
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Integer(i) => query.bind(*i),
            Value::Real(f) => query.bind(*f),
            Value::Text(t) => query.bind(t.clone()),
            Value::Blob(b) => query.bind(b.clone()),
        };
    }
    query
}

fn column_value(value: &MySqlValueRef<'_>) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let type_name = value.type_info().name().to_string();
    let owned = sqlx::ValueRef::to_owned(value);

    let decoded = match type_name.as_str() {
        "BOOLEAN" => Value::from(owned.try_decode::<bool>()?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::Integer(owned.try_decode::<i64>()?)
        }
        name if name.ends_with("UNSIGNED") => {
            let v = owned.try_decode::<u64>()?;
            i64::try_from(v).map_or_else(|_| Value::Text(v.to_string()), Value::Integer)
        }
        "YEAR" => Value::Integer(i64::from(owned.try_decode_unchecked::<u16>()?)),
        "FLOAT" => Value::Real(f64::from(owned.try_decode::<f32>()?)),
        "DOUBLE" => Value::Real(owned.try_decode::<f64>()?),
        "DATETIME" | "TIMESTAMP" => Value::Text(owned.try_decode::<NaiveDateTime>()?.to_string()),
        "DATE" => Value::Text(owned.try_decode::<NaiveDate>()?.to_string()),
        "TIME" => Value::Text(owned.try_decode::<NaiveTime>()?.to_string()),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => Value::Blob(owned.try_decode_unchecked::<Vec<u8>>()?),
        // CHAR, VARCHAR, TEXT, DECIMAL, JSON, ENUM, SET all arrive as text
        _ => match String::from_utf8(owned.try_decode_unchecked::<Vec<u8>>()?) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Blob(e.into_bytes()),
        },
    };

    Ok(decoded)
}

fn from_row(row: &MySqlRow) -> Result<Vec<Value>> {
    (0..row.len())
        .map(|i| column_value(&row.try_get_raw(i)?))
        .collect()
}

impl DriverConnection for MySqlDriver {
    fn execute(&mut self, statement: &Statement) -> Result<usize> {
        trace!("mysql execute: {} {:?}", statement.sql, statement.params);
        let query = bind_values(sqlx::query::<MySql>(&statement.sql), &statement.params);
        let conn = &mut self.conn;

        // Drain the whole response so the connection stays usable after a rejection
        let (affected, returned_rows) = self.runtime.block_on(async move {
            let mut results = conn.fetch_many(query);
            let mut affected = 0u64;
            let mut returned_rows = false;
            while let Some(step) = results.try_next().await? {
                match step {
                    Either::Left(done) => affected += done.rows_affected(),
                    Either::Right(_) => returned_rows = true,
                }
            }
            Ok::<_, DbError>((affected, returned_rows))
        })?;

        if returned_rows {
            return Err(DbError::ReturnedRows);
        }
        Ok(affected as usize)
    }

    fn query(&mut self, statement: &Statement) -> Result<QueryResult> {
        trace!("mysql query: {} {:?}", statement.sql, statement.params);
        let query = bind_values(sqlx::query::<MySql>(&statement.sql), &statement.params);
        let rows = self.runtime.block_on(query.fetch_all(&mut self.conn))?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows.iter().map(from_row).collect::<Result<Vec<_>>>()?;

        Ok(QueryResult::new(columns, rows))
    }

    fn close(self: Box<Self>) -> Result<()> {
        let MySqlDriver { conn, runtime } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
