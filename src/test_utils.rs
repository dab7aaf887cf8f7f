/// # Test Utilities Module
///
/// Shared fixtures for unit and integration tests: a scripted driver that
/// records what it is asked to run, a SQLite-backed façade fixture, and a
/// bounded wait for callback results.

use crate::callback::{Callback, ResultOrError};
use crate::config::{PoolConfig, UnhandledErrors};
use crate::core::db::{DriverConnection, QueryResult, SqliteInfo, Statement};
use crate::core::{DbError, Result, Value};
use crate::database::{Database, DatabaseOptions};
use crate::dialect::SqlType;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

/// How long tests wait for a callback before failing.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Installs a test-writer tracing subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` on this thread under a subscriber that records every log line.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogWriter(Arc::clone(&writer)))
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (result, logs)
}

/// Waits for one callback result.
pub fn recv<T>(rx: &Receiver<T>) -> T {
    rx.recv_timeout(CALLBACK_TIMEOUT)
        .expect("callback was not invoked in time")
}

/// A callback that forwards its outcome into a channel.
pub fn channel_callback<T: Send + 'static>() -> (Callback<T>, Receiver<ResultOrError<T>>) {
    let (tx, rx) = mpsc::channel();
    let callback = Callback::new(move |result| {
        let _ = tx.send(result);
    });
    (callback, rx)
}

/// Driver double that records statements and replays scripted rows.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    executed: Arc<Mutex<Vec<Statement>>>,
    result: Option<QueryResult>,
    fail: bool,
}

impl FakeDriver {
    pub fn with_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        FakeDriver {
            result: Some(QueryResult::new(
                columns.iter().map(|c| c.to_string()).collect(),
                rows,
            )),
            ..FakeDriver::default()
        }
    }

    pub fn failing() -> Self {
        FakeDriver {
            fail: true,
            ..FakeDriver::default()
        }
    }

    /// Statements seen so far, in execution order.
    pub fn statements(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    fn record(&self, statement: &Statement) -> Result<()> {
        self.executed.lock().unwrap().push(statement.clone());
        if self.fail {
            return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

impl DriverConnection for FakeDriver {
    fn execute(&mut self, statement: &Statement) -> Result<usize> {
        self.record(statement)?;
        Ok(1)
    }

    fn query(&mut self, statement: &Statement) -> Result<QueryResult> {
        self.record(statement)?;
        Ok(self
            .result
            .clone()
            .unwrap_or_else(|| QueryResult::new(Vec::new(), Vec::new())))
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// A connected in-memory SQLite façade with a `users` table.
///
/// Uses a single worker so operations complete in submission order.
pub struct DatabaseFixture {
    pub db: Database,
}

impl DatabaseFixture {
    pub fn new() -> Self {
        init_tracing();
        let db = Database::with_options(
            SqlType::Sqlite,
            Box::new(SqliteInfo::memory()),
            DatabaseOptions {
                pool: PoolConfig {
                    worker_threads: 1,
                    thread_name: "fixture-worker".to_string(),
                },
                unhandled: UnhandledErrors::Log,
            },
        )
        .expect("failed to build database");
        assert!(db.connect(), "in-memory SQLite should always connect");

        let (callback, rx) = channel_callback();
        db.query_with(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT)",
            callback,
        );
        recv(&rx).expect("failed to create users table");

        DatabaseFixture { db }
    }
}
