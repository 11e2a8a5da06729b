use tracing::debug;

use super::targets::LeasedConnection;
use crate::driver::DbConnection;
use crate::error::SqlHelperError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::CommandBehavior;

/// Forward-only, non-restartable row stream returned by the cursor execution shape.
///
/// When the helper opened the connection (connection-string target) the cursor owns it and
/// closing the cursor closes the connection (`CommandBehavior::CloseConnection`). Otherwise
/// the cursor only borrows the caller's connection and leaves it open.
pub struct RowCursor<'a, C: DbConnection> {
    connection: Option<LeasedConnection<'a, C>>,
    reader: Option<C::Reader>,
    behavior: CommandBehavior,
}

impl<C: DbConnection> std::fmt::Debug for RowCursor<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("behavior", &self.behavior)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<'a, C: DbConnection> RowCursor<'a, C> {
    pub(crate) fn new(connection: LeasedConnection<'a, C>, reader: C::Reader) -> Self {
        let behavior = if connection.is_owned() {
            CommandBehavior::CloseConnection
        } else {
            CommandBehavior::Default
        };
        Self {
            connection: Some(connection),
            reader: Some(reader),
            behavior,
        }
    }

    #[must_use]
    pub fn behavior(&self) -> CommandBehavior {
        self.behavior
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Fetch the next row; `None` once the rows are exhausted or the cursor is closed.
    ///
    /// # Errors
    /// Returns the driver error raised while reading.
    pub async fn next_row(&mut self) -> Result<Option<CustomDbRow>, SqlHelperError> {
        let (Some(connection), Some(reader)) = (self.connection.as_mut(), self.reader.as_mut())
        else {
            return Ok(None);
        };
        connection.get().read_next(reader).await
    }

    /// Read every remaining row into a `ResultSet`, then close the cursor.
    ///
    /// # Errors
    /// Returns the driver error raised while reading or closing.
    pub async fn into_result_set(mut self) -> Result<ResultSet, SqlHelperError> {
        let mut result_set = ResultSet::with_capacity(10);
        while let Some(row) = self.next_row().await? {
            result_set.add_row(row);
        }
        self.close().await?;
        Ok(result_set)
    }

    /// Close the reader, and the connection too when the cursor owns it.
    ///
    /// # Errors
    /// Returns the driver error from closing the connection.
    pub async fn close(mut self) -> Result<(), SqlHelperError> {
        self.reader = None;
        if let Some(LeasedConnection::Owned(mut conn)) = self.connection.take() {
            if self.behavior == CommandBehavior::CloseConnection {
                conn.close().await?;
                debug!("cursor closed its connection");
            }
        }
        Ok(())
    }
}

impl<C: DbConnection> Drop for RowCursor<'_, C> {
    fn drop(&mut self) {
        if matches!(self.connection, Some(LeasedConnection::Owned(_))) {
            debug!("cursor dropped without close; connection left to the driver's drop");
        }
    }
}
