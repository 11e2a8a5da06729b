// SQLite module - rusqlite-backed driver adapter
//
// This module is split into several sub-modules for better organization:
// - connection: Driver + DbConnection implementation
// - params: Parameter binding between helper and SQLite types
// - query: Statement execution and result extraction
//
// SQLite has no stored procedures: `CommandType::StoredProcedure` and parameter
// derivation both report `SqlHelperError::Unimplemented`.

pub mod connection;
pub mod params;
pub mod query;

// Re-export the public API
pub use connection::{SqliteConnection, SqliteDriver};
pub use params::row_value_to_sqlite_value;
pub use query::build_result_set;
