//! SqlHelper-style execution helpers over pluggable database drivers.
//!
//! Four execution shapes (non-query, tabular, cursor, scalar) are available against three
//! connection targets (connection string, caller connection, caller transaction), either with
//! explicit [`DbParameter`]s or with positional values bound against a stored procedure's
//! parameter signature. Signatures are discovered through the driver once and cached in a
//! [`ParameterCache`].

pub mod cache;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod helper;
pub mod parameters;
pub mod prelude;
pub mod results;
pub mod transaction;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::ParameterCache;
pub use command::Command;
pub use config::{HelperOptions, HelperOptionsBuilder, ParameterSeed};
pub use driver::{DbConnection, Driver};
pub use error::SqlHelperError;
pub use executor::{ConnectionTarget, ExecutionOutcome, ExecutionShape, RowCursor};
pub use helper::SqlHelper;
pub use parameters::{DbParameter, ParamType, ParameterCollection, ParameterDirection};
pub use results::{CustomDbRow, DataSet, ResultSet};
pub use transaction::{Transaction, begin_transaction};
pub use types::{CommandBehavior, CommandType, ConnectionState, RowValues};
