//! Dialect adapters.
//!
//! Each dialect names its driver and knows how to turn a connection string
//! into a live [`DriverConnection`]. This is the only polymorphism point.

use crate::core::db::{DriverConnection, SqlConnectionInfo, SqliteDriver};
use crate::core::{DbError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    MySql,
    MariaDb,
    Sqlite,
}

impl SqlType {
    /// Identifier of the driver backing this dialect.
    pub fn driver_name(&self) -> &'static str {
        match self {
            SqlType::MySql => "sqlx-mysql",
            SqlType::MariaDb => "sqlx-mysql (mariadb)",
            SqlType::Sqlite => "rusqlite",
        }
    }

    /// URL scheme used in this dialect's connection strings.
    pub fn scheme(&self) -> &'static str {
        match self {
            SqlType::MySql => "mysql",
            SqlType::MariaDb => "mariadb",
            SqlType::Sqlite => "sqlite",
        }
    }

    /// Whether the driver was compiled into this build.
    pub fn driver_available(&self) -> bool {
        match self {
            SqlType::MySql | SqlType::MariaDb => cfg!(feature = "mysql"),
            SqlType::Sqlite => true,
        }
    }

    /// Opens a connection with this dialect's driver.
    ///
    /// # Errors
    ///
    /// `DbError::DriverNotFound` if the driver is compiled out, otherwise
    /// whatever the driver reports while connecting.
    pub fn open(&self, info: &dyn SqlConnectionInfo) -> Result<Box<dyn DriverConnection>> {
        if !self.driver_available() {
            return Err(DbError::DriverNotFound(self.driver_name().to_string()));
        }
        debug!("Initializing driver {}", self.driver_name());

        let connection_string = info.connection_string();
        match self {
            SqlType::Sqlite => Ok(Box::new(SqliteDriver::open(&connection_string)?)),
            #[cfg(feature = "mysql")]
            SqlType::MySql | SqlType::MariaDb => Ok(Box::new(
                crate::core::db::mysql::MySqlDriver::open(&connection_string)?,
            )),
            #[cfg(not(feature = "mysql"))]
            SqlType::MySql | SqlType::MariaDb => {
                Err(DbError::DriverNotFound(self.driver_name().to_string()))
            }
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::MySql => "MySQL",
            SqlType::MariaDb => "MariaDB",
            SqlType::Sqlite => "SQLite",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SqlType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(SqlType::MySql),
            "mariadb" => Ok(SqlType::MariaDb),
            "sqlite" | "sqlite3" => Ok(SqlType::Sqlite),
            _ => Err(DbError::UnsupportedType(s.to_string())),
        }
    }
}
