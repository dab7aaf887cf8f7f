//! The database façade.
//!
//! A [`Database`] owns at most one live connection and a background
//! [`WorkerPool`]. `connect()` runs on the calling thread; every other
//! operation is queued on the pool and returns immediately. Outcomes go to an
//! optional [`Callback`]; without one, errors go to the configured
//! [`UnhandledErrors`] policy, which discards them by default.
//!
//! The connection is shared by all queued operations behind a mutex, so
//! statements never run concurrently on it. Operations are not ordered with
//! respect to each other unless the pool has a single worker.

use crate::callback::{Callback, ResultOrError};
use crate::config::{PoolConfig, UnhandledErrors};
use crate::core::db::{
    build_insert, build_select, build_update, DriverConnection, QueryResult, SqlConnectionInfo,
    Statement,
};
use crate::core::{DbError, Pair, Result, RowMap, Value};
use crate::dialect::SqlType;
use crate::pool::WorkerPool;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

type SharedConnection = Arc<Mutex<Option<Box<dyn DriverConnection>>>>;

/// Construction options for a [`Database`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub pool: PoolConfig,
    pub unhandled: UnhandledErrors,
}

/// Asynchronous CRUD façade over a single connection.
pub struct Database {
    sql_type: SqlType,
    connect_info: Box<dyn SqlConnectionInfo>,
    connection: SharedConnection,
    unhandled: UnhandledErrors,
    pool: WorkerPool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("sql_type", &self.sql_type)
            .field("connect_info", &self.connect_info)
            .field("unhandled", &self.unhandled)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates a disconnected façade with default options.
    pub fn new(sql_type: SqlType, info: impl SqlConnectionInfo + 'static) -> Result<Self> {
        Database::with_options(sql_type, Box::new(info), DatabaseOptions::default())
    }

    /// Creates a disconnected façade.
    ///
    /// # Errors
    ///
    /// Fails only if the worker pool cannot be started.
    pub fn with_options(
        sql_type: SqlType,
        info: Box<dyn SqlConnectionInfo>,
        options: DatabaseOptions,
    ) -> Result<Self> {
        let pool = WorkerPool::new(&options.pool)?;
        Ok(Database {
            sql_type,
            connect_info: info,
            connection: Arc::new(Mutex::new(None)),
            unhandled: options.unhandled,
            pool,
        })
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn connection_info(&self) -> &dyn SqlConnectionInfo {
        self.connect_info.as_ref()
    }

    /// Opens the connection, blocking the calling thread.
    ///
    /// Returns `false` and logs the reason if the driver is missing or the
    /// connection attempt fails. A previous connection is replaced.
    pub fn connect(&self) -> bool {
        let conn = match self.sql_type.open(self.connect_info.as_ref()) {
            Ok(conn) => conn,
            Err(e) => {
                error!("[DATABASE] {}", e);
                return false;
            }
        };

        let Ok(mut guard) = self.connection.lock() else {
            error!("[DATABASE] {}", DbError::Lock);
            return false;
        };
        *guard = Some(conn);
        info!("Connected to {} database", self.sql_type);
        true
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Closes the connection in the background. Close failures are ignored.
    pub fn close(&self) {
        let connection = Arc::clone(&self.connection);
        self.pool.execute(move || {
            let taken = connection.lock().ok().and_then(|mut guard| guard.take());
            if let Some(conn) = taken {
                match conn.close() {
                    Ok(()) => info!("Database connection closed"),
                    Err(e) => debug!("Ignoring error while closing connection: {}", e),
                }
            }
        });
    }

    /// Executes an arbitrary statement in the background. Rows are not read.
    pub fn query(&self, sql: impl Into<String>) {
        self.submit_query(sql.into(), None);
    }

    /// Like [`query`](Self::query), reporting completion to `callback`.
    pub fn query_with(&self, sql: impl Into<String>, callback: Callback<()>) {
        self.submit_query(sql.into(), Some(callback));
    }

    fn submit_query(&self, sql: String, callback: Option<Callback<()>>) {
        let statement = Statement::raw(sql);
        self.submit(callback, move |conn| conn.execute(&statement).map(|_| ()));
    }

    /// `SELECT * FROM table WHERE where_column = selector` in the background.
    pub fn select(&self, table: &str, where_column: &str, selector: impl Into<Value>) {
        self.submit_select(table, where_column, selector.into(), None);
    }

    /// Like [`select`](Self::select), reporting the row to `callback`.
    ///
    /// Every returned row is folded into the same map, so when several rows
    /// match only the last one's values are reported.
    pub fn select_with(
        &self,
        table: &str,
        where_column: &str,
        selector: impl Into<Value>,
        callback: Callback<RowMap>,
    ) {
        self.submit_select(table, where_column, selector.into(), Some(callback));
    }

    fn submit_select(
        &self,
        table: &str,
        where_column: &str,
        selector: Value,
        callback: Option<Callback<RowMap>>,
    ) {
        let statement = build_select(table, where_column, selector);
        self.submit(callback, move |conn| conn.query(&statement).map(fold_rows));
    }

    /// Inserts one row built from `pairs` in the background.
    pub fn insert<I>(&self, table: &str, pairs: I)
    where
        I: IntoIterator,
        I::Item: Into<Pair>,
    {
        self.submit_insert(table, collect_pairs(pairs), None);
    }

    /// Like [`insert`](Self::insert), reporting completion to `callback`.
    pub fn insert_with<I>(&self, table: &str, pairs: I, callback: Callback<()>)
    where
        I: IntoIterator,
        I::Item: Into<Pair>,
    {
        self.submit_insert(table, collect_pairs(pairs), Some(callback));
    }

    fn submit_insert(&self, table: &str, pairs: Vec<Pair>, callback: Option<Callback<()>>) {
        let statement = build_insert(table, &pairs);
        self.submit(callback, move |conn| conn.execute(&statement).map(|_| ()));
    }

    /// Sets `pairs` on rows where `where_column = selector`, in the background.
    pub fn update<I>(&self, table: &str, where_column: &str, selector: impl Into<Value>, pairs: I)
    where
        I: IntoIterator,
        I::Item: Into<Pair>,
    {
        self.submit_update(table, where_column, selector.into(), collect_pairs(pairs), None);
    }

    /// Like [`update`](Self::update), reporting completion to `callback`.
    pub fn update_with<I>(
        &self,
        table: &str,
        where_column: &str,
        selector: impl Into<Value>,
        pairs: I,
        callback: Callback<()>,
    ) where
        I: IntoIterator,
        I::Item: Into<Pair>,
    {
        self.submit_update(
            table,
            where_column,
            selector.into(),
            collect_pairs(pairs),
            Some(callback),
        );
    }

    fn submit_update(
        &self,
        table: &str,
        where_column: &str,
        selector: Value,
        pairs: Vec<Pair>,
        callback: Option<Callback<()>>,
    ) {
        let statement = build_update(table, where_column, selector, &pairs);
        self.submit(callback, move |conn| conn.execute(&statement).map(|_| ()));
    }

    /// Queues `operation` against the shared connection and routes its outcome.
    fn submit<T, F>(&self, callback: Option<Callback<T>>, operation: F)
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn DriverConnection) -> Result<T> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let unhandled = self.unhandled;

        self.pool.execute(move || {
            let result = with_connection(&connection, operation);
            match callback {
                Some(callback) => callback.complete(result),
                None => {
                    if let Err(e) = result {
                        report_unhandled(unhandled, &e);
                    }
                }
            }
        });
    }

    /// Installs an already-open driver connection.
    #[cfg(test)]
    pub(crate) fn attach(&self, conn: Box<dyn DriverConnection>) {
        *self.connection.lock().unwrap() = Some(conn);
    }
}

fn collect_pairs<I>(pairs: I) -> Vec<Pair>
where
    I: IntoIterator,
    I::Item: Into<Pair>,
{
    pairs.into_iter().map(Into::into).collect()
}

/// Runs `operation` while holding the connection lock. The lock is released
/// before the caller reports the result.
fn with_connection<T, F>(
    connection: &Mutex<Option<Box<dyn DriverConnection>>>,
    operation: F,
) -> ResultOrError<T>
where
    F: FnOnce(&mut dyn DriverConnection) -> Result<T>,
{
    let mut guard = connection.lock().map_err(|_| DbError::Lock)?;
    let conn = guard.as_mut().ok_or(DbError::NotConnected)?;
    operation(conn.as_mut())
}

/// Folds all rows into one map; later rows overwrite earlier ones.
pub fn fold_rows(result: QueryResult) -> RowMap {
    let mut row_map = RowMap::new();
    for row in result.rows {
        for (column, value) in result.columns.iter().zip(row) {
            row_map.insert(column.clone(), value);
        }
    }
    row_map
}

fn report_unhandled(policy: UnhandledErrors, error: &DbError) {
    match policy {
        UnhandledErrors::Discard => {}
        UnhandledErrors::Log => warn!("Unhandled database error: {}", error),
    }
}
