/// Core Module
///
/// Shared infrastructure used by the façade: the error type, dynamically
/// typed values, connection info, statement building and the drivers.

pub mod db;
pub mod error;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{DbError, ErrorKind, Result};
pub use value::{row_to_json, Pair, RowMap, Value};
