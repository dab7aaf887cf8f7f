/// Database Module
///
/// The layer below the façade, organized into focused submodules:
/// - **Connection Info** (`connection.rs`): where a database lives and its connection string
/// - **Statement Building** (`query.rs`): parameterized SQL for select/insert/update
/// - **Drivers** (`driver.rs`, `mysql.rs`): one open connection per backend
///
/// All operations use the crate-wide `DbError` type.
pub mod connection;
pub mod driver;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod query;

pub use connection::*;
pub use driver::*;
pub use query::*;
