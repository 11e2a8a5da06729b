use tracing::{debug, warn};

use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::transaction::Transaction;

/// Where a command runs, and therefore who opens and closes the connection.
///
/// - `ConnectionString`: the helper opens a fresh connection and closes it when the call
///   completes or fails (for cursors, when the cursor is closed).
/// - `Connection`: the caller owns the connection; it is opened if needed and never closed.
/// - `Transaction`: the transaction's connection is used as-is; it must be open and the
///   transaction still active.
pub enum ConnectionTarget<'a, C: DbConnection> {
    ConnectionString(&'a str),
    Connection(&'a mut C),
    Transaction { connection: &'a mut C, active: bool },
}

impl<C: DbConnection> ConnectionTarget<'_, C> {
    /// Identity used to key the parameter cache.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        match self {
            ConnectionTarget::ConnectionString(cs) => cs,
            ConnectionTarget::Connection(conn) => conn.connection_string(),
            ConnectionTarget::Transaction { connection, .. } => connection.connection_string(),
        }
    }
}

impl<'a, C: DbConnection> From<&'a str> for ConnectionTarget<'a, C> {
    fn from(connection_string: &'a str) -> Self {
        ConnectionTarget::ConnectionString(connection_string)
    }
}

impl<'a, C: DbConnection> From<&'a String> for ConnectionTarget<'a, C> {
    fn from(connection_string: &'a String) -> Self {
        ConnectionTarget::ConnectionString(connection_string.as_str())
    }
}

impl<'a, C: DbConnection> From<&'a mut C> for ConnectionTarget<'a, C> {
    fn from(connection: &'a mut C) -> Self {
        ConnectionTarget::Connection(connection)
    }
}

impl<'a, 'c: 'a, C: DbConnection> From<&'a mut Transaction<'c, C>> for ConnectionTarget<'a, C> {
    fn from(tx: &'a mut Transaction<'c, C>) -> Self {
        ConnectionTarget::Transaction {
            active: tx.is_active(),
            connection: &mut *tx.connection,
        }
    }
}

/// A connection either opened by the helper or borrowed from the caller.
pub(crate) enum LeasedConnection<'a, C> {
    Owned(C),
    Borrowed(&'a mut C),
}

impl<C: DbConnection> LeasedConnection<'_, C> {
    pub(crate) fn get(&mut self) -> &mut C {
        match self {
            LeasedConnection::Owned(conn) => conn,
            LeasedConnection::Borrowed(conn) => conn,
        }
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, LeasedConnection::Owned(_))
    }
}

/// An open connection ready for one execution, plus the closing policy that goes with it.
pub(crate) struct Lease<'a, C> {
    pub(crate) connection: LeasedConnection<'a, C>,
    pub(crate) in_transaction: bool,
}

impl<'a, C: DbConnection> Lease<'a, C> {
    /// Resolve `target` into an open connection.
    ///
    /// # Errors
    /// Returns the driver error if a connection cannot be created or opened, or
    /// `SqlHelperError::ConnectionError` for an unusable transaction target.
    pub(crate) async fn acquire<D>(
        driver: &D,
        target: ConnectionTarget<'a, C>,
    ) -> Result<Self, SqlHelperError>
    where
        D: Driver<Connection = C>,
    {
        match target {
            ConnectionTarget::ConnectionString(connection_string) => {
                let mut conn = driver.create_connection(connection_string)?;
                conn.open().await?;
                debug!("opened connection for a single execution");
                Ok(Lease {
                    connection: LeasedConnection::Owned(conn),
                    in_transaction: false,
                })
            }
            ConnectionTarget::Connection(conn) => {
                if !conn.is_open() {
                    conn.open().await?;
                }
                Ok(Lease {
                    connection: LeasedConnection::Borrowed(conn),
                    in_transaction: false,
                })
            }
            ConnectionTarget::Transaction { connection, active } => {
                if !active {
                    return Err(SqlHelperError::ConnectionError(
                        "transaction has already been committed or rolled back".to_string(),
                    ));
                }
                if !connection.is_open() {
                    return Err(SqlHelperError::ConnectionError(
                        "transaction connection is not open".to_string(),
                    ));
                }
                Ok(Lease {
                    connection: LeasedConnection::Borrowed(connection),
                    in_transaction: true,
                })
            }
        }
    }

    pub(crate) fn connection(&mut self) -> &mut C {
        self.connection.get()
    }

    /// Close the connection if the helper opened it.
    ///
    /// # Errors
    /// Returns the driver error from `close`.
    pub(crate) async fn release(mut self) -> Result<(), SqlHelperError> {
        if self.connection.is_owned() {
            self.connection.get().close().await?;
            debug!("closed connection after execution");
        }
        Ok(())
    }

    /// Close the connection if the helper opened it, without masking the error already
    /// being returned.
    pub(crate) async fn release_after_error(mut self) {
        if self.connection.is_owned() {
            if let Err(e) = self.connection.get().close().await {
                warn!(error = %e, "closing connection after failed execution also failed");
            }
        }
    }
}
