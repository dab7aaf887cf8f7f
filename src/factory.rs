//! Entry point for constructing a [`Database`] by dialect.

use crate::config::Config;
use crate::core::db::SqlConnectionInfo;
use crate::core::Result;
use crate::database::{Database, DatabaseOptions};
use crate::dialect::SqlType;
use tracing::debug;

/// Factory for database façades.
pub struct DatabaseLib;

impl DatabaseLib {
    /// Builds a façade for the dialect named by `tag` (`mysql`, `mariadb`, `sqlite`).
    ///
    /// # Errors
    ///
    /// `DbError::UnsupportedType` for an unrecognized tag. Nothing is queued
    /// on a worker; the failure is immediate.
    pub fn init(tag: &str, info: impl SqlConnectionInfo + 'static) -> Result<Database> {
        let sql_type: SqlType = tag.parse()?;
        DatabaseLib::init_type(sql_type, info)
    }

    /// Builds a façade for a known dialect.
    pub fn init_type(
        sql_type: SqlType,
        info: impl SqlConnectionInfo + 'static,
    ) -> Result<Database> {
        debug!("Initializing {} database", sql_type);
        Database::new(sql_type, info)
    }

    /// Builds a façade from a loaded configuration file.
    pub fn from_config(config: &Config) -> Result<Database> {
        config.validate()?;
        let sql_type: SqlType = config.database.sql_type.parse()?;
        let info = config.database.connection_info(sql_type)?;
        debug!("Initializing {} database from configuration", sql_type);

        Database::with_options(
            sql_type,
            info,
            DatabaseOptions {
                pool: config.pool.clone(),
                unhandled: config.errors.unhandled,
            },
        )
    }
}
