//! Asynchronous CRUD façade over a single SQL connection.
//!
//! ```no_run
//! use dbapi::{Callback, ConnectionInfo, DatabaseLib, Pair};
//!
//! let db = DatabaseLib::init("mariadb", ConnectionInfo::new("localhost", "root", "", "app"))?;
//! if db.connect() {
//!     db.insert("users", [Pair::new("id", 1), Pair::new("name", "a")]);
//!     db.select_with("users", "id", 1, Callback::new(|row| println!("{:?}", row)));
//! }
//! # Ok::<(), dbapi::DbError>(())
//! ```

// Core infrastructure modules
pub mod core;

// Façade and its surroundings
pub mod callback;
pub mod config;
pub mod database;
pub mod dialect;
pub mod factory;
pub mod pool;

#[cfg(test)]
pub(crate) mod test_utils;

pub use callback::{Callback, ResultCallback, ResultOrError};
pub use config::{load_config, parse_config, Config, PoolConfig, UnhandledErrors};
pub use crate::core::db::{ConnectionInfo, SqlConnectionInfo, SqliteInfo};
pub use crate::core::{row_to_json, DbError, ErrorKind, Pair, Result, RowMap, Value};
pub use database::{Database, DatabaseOptions};
pub use dialect::SqlType;
pub use factory::DatabaseLib;
