use async_trait::async_trait;

use crate::command::Command;
use crate::error::SqlHelperError;
use crate::parameters::DbParameter;
use crate::results::{CustomDbRow, DataSet};
use crate::types::{CommandType, ConnectionState, RowValues};

/// Connection factory for one database backend.
///
/// The helper never names a driver type directly; everything goes through this trait and
/// [`DbConnection`].
pub trait Driver: Send + Sync {
    type Connection: DbConnection;

    /// Build a connection in the `Closed` state for `connection_string`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` if the connection string cannot be parsed.
    fn create_connection(
        &self,
        connection_string: &str,
    ) -> Result<Self::Connection, SqlHelperError>;
}

/// A single driver connection.
///
/// Connections are used by one caller at a time; nothing here is expected to be shared
/// across concurrent executions.
#[async_trait]
pub trait DbConnection: Send {
    /// Handle for a forward-only row stream produced by [`execute_reader`](Self::execute_reader).
    type Reader: Send;

    /// Identity of this connection; the parameter cache is keyed on it.
    fn connection_string(&self) -> &str;

    fn state(&self) -> ConnectionState;

    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// A fresh command bound to this connection, with no parameters attached.
    #[must_use]
    fn create_command(&self, command_type: CommandType, command_text: &str) -> Command {
        Command::new(command_type, command_text)
    }

    async fn open(&mut self) -> Result<(), SqlHelperError>;

    async fn close(&mut self) -> Result<(), SqlHelperError>;

    async fn begin_transaction(&mut self) -> Result<(), SqlHelperError>;

    async fn commit_transaction(&mut self) -> Result<(), SqlHelperError>;

    async fn rollback_transaction(&mut self) -> Result<(), SqlHelperError>;

    /// Run the command and return the number of rows affected.
    async fn execute_non_query(&mut self, command: &mut Command) -> Result<usize, SqlHelperError>;

    /// Run the command and materialize every result set it produces.
    async fn execute_tabular(&mut self, command: &mut Command) -> Result<DataSet, SqlHelperError>;

    /// Run the command and return a reader positioned before the first row.
    async fn execute_reader(
        &mut self,
        command: &mut Command,
    ) -> Result<Self::Reader, SqlHelperError>;

    /// Advance `reader`; `None` once the rows are exhausted.
    async fn read_next(
        &mut self,
        reader: &mut Self::Reader,
    ) -> Result<Option<CustomDbRow>, SqlHelperError>;

    /// Run the command and return the first column of the first row, if any.
    async fn execute_scalar(
        &mut self,
        command: &mut Command,
    ) -> Result<Option<RowValues>, SqlHelperError>;

    /// Derive the parameter signature of a stored procedure on this (open) connection.
    ///
    /// The return-value parameter, when the backend reports one, comes first.
    async fn derive_parameters(
        &mut self,
        procedure_name: &str,
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        let _ = procedure_name;
        Err(SqlHelperError::Unimplemented(
            "parameter derivation is not supported by this driver".to_string(),
        ))
    }
}
