use crate::core::db::{ConnectionInfo, SqlConnectionInfo, SqliteInfo, DEFAULT_PORT, MEMORY_PATH};
use crate::core::{DbError, Result};
use crate::dialect::SqlType;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
}

/// Which database to open and how to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Dialect tag: `mysql`, `mariadb` or `sqlite`
    #[serde(rename = "type")]
    pub sql_type: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    /// SQLite file path, `:memory:` when omitted
    pub path: Option<String>,
}

/// Background worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_worker_threads() -> usize {
    4
}

fn default_thread_name() -> String {
    "dbapi-worker".to_string()
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            worker_threads: default_worker_threads(),
            thread_name: default_thread_name(),
        }
    }
}

/// What happens to an error from an operation issued without a callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledErrors {
    /// Drop it silently
    #[default]
    Discard,
    /// Emit a warning through `tracing`
    Log,
}

/// Error reporting settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorsConfig {
    #[serde(default)]
    pub unhandled: UnhandledErrors,
}

impl DatabaseConfig {
    /// Builds the connection info for the given dialect.
    ///
    /// Network dialects require `host`, `user` and `name`; SQLite only reads `path`.
    pub fn connection_info(&self, sql_type: SqlType) -> Result<Box<dyn SqlConnectionInfo>> {
        if sql_type == SqlType::Sqlite {
            let path = self.path.clone().unwrap_or_else(|| MEMORY_PATH.to_string());
            return Ok(Box::new(SqliteInfo::new(path)));
        }

        let required = |field: &Option<String>, name: &str| {
            field
                .clone()
                .ok_or_else(|| DbError::Config(format!("missing `database.{}`", name)))
        };

        let info = ConnectionInfo::new(
            required(&self.host, "host")?,
            required(&self.user, "user")?,
            self.password.clone().unwrap_or_default(),
            required(&self.name, "name")?,
        )
        .with_port(self.port.unwrap_or(DEFAULT_PORT))
        .with_scheme(sql_type.scheme());

        Ok(Box::new(info))
    }
}

impl Config {
    /// Rejects settings the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pool.worker_threads == 0 {
            return Err(DbError::Config(
                "`pool.worker_threads` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses and validates configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = dbapi::config::load_config("dbapi.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
