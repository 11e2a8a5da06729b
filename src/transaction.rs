use tracing::warn;

use crate::driver::DbConnection;
use crate::error::SqlHelperError;

/// Lightweight transaction wrapper over a caller-owned connection.
///
/// Pass `&mut tx` wherever a [`ConnectionTarget`](crate::executor::ConnectionTarget) is
/// accepted to run commands inside the transaction. Dropping a `Transaction` without calling
/// [`commit`](Transaction::commit) or [`rollback`](Transaction::rollback) leaves the
/// connection mid-transaction. Always finish the transaction explicitly.
pub struct Transaction<'c, C: DbConnection> {
    pub(crate) connection: &'c mut C,
    open: bool,
}

/// Begin a new transaction on `connection`, opening the connection first if it is closed.
///
/// # Errors
/// Returns the driver error if opening the connection or issuing BEGIN fails.
pub async fn begin_transaction<C: DbConnection>(
    connection: &mut C,
) -> Result<Transaction<'_, C>, SqlHelperError> {
    if !connection.is_open() {
        connection.open().await?;
    }
    connection.begin_transaction().await?;

    Ok(Transaction {
        connection,
        open: true,
    })
}

impl<C: DbConnection> Transaction<'_, C> {
    /// True until the transaction is committed or rolled back.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.open
    }

    /// The connection the transaction runs on.
    #[must_use]
    pub fn connection(&self) -> &C {
        self.connection
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError` if commit fails.
    pub async fn commit(mut self) -> Result<(), SqlHelperError> {
        if self.open {
            self.connection.commit_transaction().await?;
            self.open = false;
        }
        Ok(())
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError` if rollback fails.
    pub async fn rollback(mut self) -> Result<(), SqlHelperError> {
        if self.open {
            self.connection.rollback_transaction().await?;
            self.open = false;
        }
        Ok(())
    }
}

impl<C: DbConnection> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.open {
            warn!("transaction dropped without commit or rollback");
        }
    }
}
