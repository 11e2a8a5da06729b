//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::cache::ParameterCache;
pub use crate::command::Command;
pub use crate::config::{HelperOptions, HelperOptionsBuilder, ParameterSeed};
pub use crate::driver::{DbConnection, Driver};
pub use crate::error::SqlHelperError;
pub use crate::executor::{ConnectionTarget, ExecutionOutcome, ExecutionShape, RowCursor};
pub use crate::helper::SqlHelper;
pub use crate::parameters::{DbParameter, ParamType, ParameterDirection};
pub use crate::results::{CustomDbRow, DataSet, ResultSet};
pub use crate::transaction::{Transaction, begin_transaction};
pub use crate::types::{CommandBehavior, CommandType, ConnectionState, RowValues};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlConnection, MssqlDriver};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteDriver};
