/// Error Module
///
/// This module defines the error type shared by every layer of the crate.
/// Each variant belongs to one of three kinds (see [`ErrorKind`]) which
/// decide how the error reaches the caller: as a `false` from `connect()`,
/// through a completion callback, or directly from a constructor.
use thiserror::Error;

/// Broad classification of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Driver missing or connection establishment failed
    Connection,
    /// Failure while preparing or executing a statement
    Statement,
    /// Invalid configuration or unrecognized dialect
    Configuration,
}

/// Error type for every database operation.
#[derive(Error, Debug)]
pub enum DbError {
    /// The driver for a dialect was not compiled into this build
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// The driver could not establish a connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// The blocking runtime used by a network driver could not be built
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Errors reported by SQLite
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Errors reported by the MySQL wire driver
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    MySql(#[from] sqlx::Error),

    /// A statement sent through the update path produced a result set
    #[error("Statement returned rows; use select to read them")]
    ReturnedRows,

    /// An operation ran while no connection was open
    #[error("Not connected")]
    NotConnected,

    /// The connection lock was poisoned by a panicking statement
    #[error("Failed to acquire connection lock")]
    Lock,

    /// Unrecognized dialect tag
    #[error("Unsupported database type: {0}")]
    UnsupportedType(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DbError {
    /// Returns the kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::DriverNotFound(_) | DbError::Connection(_) | DbError::Runtime(_) => {
                ErrorKind::Connection
            }
            DbError::Sqlite(_)
            | DbError::ReturnedRows
            | DbError::NotConnected
            | DbError::Lock => ErrorKind::Statement,
            #[cfg(feature = "mysql")]
            DbError::MySql(_) => ErrorKind::Statement,
            DbError::UnsupportedType(_)
            | DbError::Config(_)
            | DbError::Io(_)
            | DbError::Toml(_) => ErrorKind::Configuration,
        }
    }
}

/// Type alias for Result to use DbError as the error type.
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = DbError::Sqlite(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let type_err = DbError::UnsupportedType("oracle".to_string());
        assert_eq!(type_err.to_string(), "Unsupported database type: oracle");

        assert_eq!(DbError::NotConnected.to_string(), "Not connected");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DbError::DriverNotFound("x".into()).kind(), ErrorKind::Connection);
        assert_eq!(DbError::Connection("refused".into()).kind(), ErrorKind::Connection);
        assert_eq!(DbError::NotConnected.kind(), ErrorKind::Statement);
        assert_eq!(DbError::ReturnedRows.kind(), ErrorKind::Statement);
        assert_eq!(
            DbError::Sqlite(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Statement
        );
        assert_eq!(DbError::UnsupportedType("x".into()).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DbError = io_err.into();
        match err {
            DbError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: DbError = toml_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
