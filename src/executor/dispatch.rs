use std::time::Duration;

use super::cursor::RowCursor;
use super::targets::{ConnectionTarget, Lease};
use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::parameters::DbParameter;
use crate::results::DataSet;
use crate::types::{CommandType, RowValues};

/// The four ways a command can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionShape {
    /// Rows affected.
    NonQuery,
    /// Every result set, materialized into a [`DataSet`].
    Tabular,
    /// A [`RowCursor`] over the first result set.
    Cursor,
    /// First column of the first row.
    Scalar,
}

/// Result of [`execute`], one variant per [`ExecutionShape`].
pub enum ExecutionOutcome<'a, C: DbConnection> {
    RowsAffected(usize),
    Tabular(DataSet),
    Cursor(RowCursor<'a, C>),
    Scalar(Option<RowValues>),
}

impl<C: DbConnection> std::fmt::Debug for ExecutionOutcome<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowsAffected(rows) => f.debug_tuple("RowsAffected").field(rows).finish(),
            Self::Tabular(data) => f.debug_tuple("Tabular").field(data).finish(),
            Self::Cursor(_) => f.debug_tuple("Cursor").field(&"<RowCursor>").finish(),
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
        }
    }
}

impl<'a, C: DbConnection> ExecutionOutcome<'a, C> {
    fn mismatch(&self, expected: ExecutionShape) -> SqlHelperError {
        SqlHelperError::Other(format!("expected {expected:?} outcome, got {self:?}"))
    }

    /// # Errors
    /// Returns `SqlHelperError::Other` if the outcome is not `RowsAffected`.
    pub fn into_rows_affected(self) -> Result<usize, SqlHelperError> {
        match self {
            Self::RowsAffected(rows) => Ok(rows),
            other => Err(other.mismatch(ExecutionShape::NonQuery)),
        }
    }

    /// # Errors
    /// Returns `SqlHelperError::Other` if the outcome is not `Tabular`.
    pub fn into_data_set(self) -> Result<DataSet, SqlHelperError> {
        match self {
            Self::Tabular(data) => Ok(data),
            other => Err(other.mismatch(ExecutionShape::Tabular)),
        }
    }

    /// # Errors
    /// Returns `SqlHelperError::Other` if the outcome is not `Cursor`.
    pub fn into_cursor(self) -> Result<RowCursor<'a, C>, SqlHelperError> {
        match self {
            Self::Cursor(cursor) => Ok(cursor),
            other => Err(other.mismatch(ExecutionShape::Cursor)),
        }
    }

    /// # Errors
    /// Returns `SqlHelperError::Other` if the outcome is not `Scalar`.
    pub fn into_scalar(self) -> Result<Option<RowValues>, SqlHelperError> {
        match self {
            Self::Scalar(value) => Ok(value),
            other => Err(other.mismatch(ExecutionShape::Scalar)),
        }
    }
}

/// Run `command_text` against `target` in the requested shape.
///
/// The command is built by the leased connection's
/// [`create_command`](DbConnection::create_command) and carries `timeout` through to the
/// driver. `parameters` are attached to the command (unassigned `InputOutput` values become
/// database null), and after execution the values the driver left on the command are copied
/// back into `parameters` by position before the command's collection is cleared.
///
/// A connection opened here is closed before returning, on success and on failure. For
/// [`ExecutionShape::Cursor`] it is handed to the cursor instead, unless obtaining the
/// reader failed.
///
/// # Errors
/// Driver errors are returned unchanged.
pub async fn execute<'a, D: Driver>(
    driver: &D,
    target: ConnectionTarget<'a, D::Connection>,
    shape: ExecutionShape,
    command_type: CommandType,
    command_text: &str,
    timeout: Option<Duration>,
    parameters: &mut [DbParameter],
) -> Result<ExecutionOutcome<'a, D::Connection>, SqlHelperError> {
    let mut lease = Lease::acquire(driver, target).await?;

    let mut command = lease.connection().create_command(command_type, command_text);
    command.timeout = timeout;
    command.in_transaction = lease.in_transaction;
    command.attach_parameters(parameters);

    let result = match shape {
        ExecutionShape::NonQuery => lease
            .connection()
            .execute_non_query(&mut command)
            .await
            .map(ExecutionOutcome::RowsAffected),
        ExecutionShape::Tabular => lease
            .connection()
            .execute_tabular(&mut command)
            .await
            .map(ExecutionOutcome::Tabular),
        ExecutionShape::Scalar => lease
            .connection()
            .execute_scalar(&mut command)
            .await
            .map(ExecutionOutcome::Scalar),
        ExecutionShape::Cursor => {
            let reader = lease.connection().execute_reader(&mut command).await;
            command.detach_parameters(parameters);
            return match reader {
                Ok(reader) => Ok(ExecutionOutcome::Cursor(RowCursor::new(
                    lease.connection,
                    reader,
                ))),
                Err(e) => {
                    lease.release_after_error().await;
                    Err(e)
                }
            };
        }
    };

    command.detach_parameters(parameters);

    match result {
        Ok(outcome) => {
            lease.release().await?;
            Ok(outcome)
        }
        Err(e) => {
            lease.release_after_error().await;
            Err(e)
        }
    }
}
