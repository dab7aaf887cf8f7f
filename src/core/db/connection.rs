/// Connection Info Module
///
/// Value types that describe where a database lives and render the
/// connection string handed to the driver.
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded::byte_serialize;

/// Default port for the MySQL family of servers.
pub const DEFAULT_PORT: u16 = 3306;

/// Default URL scheme for network connection strings.
pub const DEFAULT_SCHEME: &str = "mysql";

/// Path that selects an in-memory SQLite database.
pub const MEMORY_PATH: &str = ":memory:";

/// Anything that can produce a driver connection string.
pub trait SqlConnectionInfo: fmt::Debug + Send + Sync {
    /// Returns the url for the database connection.
    fn connection_string(&self) -> String;
}

/// Network connection parameters for a MySQL-family server.
///
/// No validation happens here; bad values surface as a failed `connect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

impl ConnectionInfo {
    /// Creates connection info with the default port and scheme.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        ConnectionInfo {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            scheme: default_scheme(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

impl SqlConnectionInfo for ConnectionInfo {
    fn connection_string(&self) -> String {
        format!(
            "{}://{}:{}/{}?user={}&password={}",
            self.scheme,
            self.host,
            self.port,
            self.database,
            form_encode(&self.user),
            form_encode(&self.password)
        )
    }
}

fn form_encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Location of a SQLite database file, or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteInfo {
    pub path: String,
}

impl SqliteInfo {
    pub fn new(path: impl Into<String>) -> Self {
        SqliteInfo { path: path.into() }
    }

    pub fn memory() -> Self {
        SqliteInfo::new(MEMORY_PATH)
    }
}

impl SqlConnectionInfo for SqliteInfo {
    fn connection_string(&self) -> String {
        if self.path == MEMORY_PATH {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}", self.path)
        }
    }
}

/// Extracts the SQLite path back out of a connection string.
///
/// Accepts `sqlite::memory:`, `sqlite://<path>`, or a bare path.
pub fn sqlite_path(connection_string: &str) -> &str {
    if connection_string == "sqlite::memory:" {
        MEMORY_PATH
    } else if let Some(path) = connection_string.strip_prefix("sqlite://") {
        path
    } else {
        connection_string
    }
}
