use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use super::query;
use crate::command::Command;
use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::results::{CustomDbRow, DataSet};
use crate::types::{ConnectionState, RowValues};

type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Driver for SQLite databases. The connection string is a file path or `:memory:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn create_connection(&self, connection_string: &str) -> Result<SqliteConnection, SqlHelperError> {
        if connection_string.trim().is_empty() {
            return Err(SqlHelperError::ConfigError(
                "SQLite connection string (database path) is empty".to_string(),
            ));
        }
        Ok(SqliteConnection {
            path: connection_string.to_string(),
            conn: None,
        })
    }
}

/// A single rusqlite connection. Statements run on the blocking pool.
pub struct SqliteConnection {
    path: String,
    conn: Option<SharedSqliteConnection>,
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl SqliteConnection {
    fn handle(&self) -> Result<SharedSqliteConnection, SqlHelperError> {
        self.conn.clone().ok_or_else(|| {
            SqlHelperError::ConnectionError("SQLite connection is not open".to_string())
        })
    }

    async fn run<F, R>(&self, command: &Command, func: F) -> Result<R, SqlHelperError>
    where
        F: FnOnce(&rusqlite::Connection, &Command) -> Result<R, SqlHelperError> + Send + 'static,
        R: Send + 'static,
    {
        let command = command.clone();
        run_blocking(self.handle()?, move |conn| func(conn, &command)).await
    }

    async fn execute_batch(&self, sql: &'static str) -> Result<(), SqlHelperError> {
        run_blocking(self.handle()?, move |conn| {
            conn.execute_batch(sql).map_err(SqlHelperError::SqliteError)
        })
        .await
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, SqlHelperError>
where
    F: FnOnce(&rusqlite::Connection) -> Result<R, SqlHelperError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let guard = conn.blocking_lock();
        func(&guard)
    })
    .await
    .map_err(|e| SqlHelperError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

#[async_trait]
impl DbConnection for SqliteConnection {
    type Reader = VecDeque<CustomDbRow>;

    fn connection_string(&self) -> &str {
        &self.path
    }

    fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    async fn open(&mut self) -> Result<(), SqlHelperError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let path = self.path.clone();
        let conn = spawn_blocking(move || rusqlite::Connection::open(path))
            .await
            .map_err(|e| {
                SqlHelperError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
            })??;
        self.conn = Some(Arc::new(Mutex::new(conn)));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlHelperError> {
        // The last handle drops the rusqlite connection, which closes it.
        self.conn = None;
        Ok(())
    }

    async fn begin_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("BEGIN").await
    }

    async fn commit_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("COMMIT").await
    }

    async fn rollback_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("ROLLBACK").await
    }

    async fn execute_non_query(&mut self, command: &mut Command) -> Result<usize, SqlHelperError> {
        self.run(command, query::execute_non_query).await
    }

    async fn execute_tabular(&mut self, command: &mut Command) -> Result<DataSet, SqlHelperError> {
        self.run(command, query::execute_tabular)
            .await
            .map(DataSet::from)
    }

    async fn execute_reader(
        &mut self,
        command: &mut Command,
    ) -> Result<Self::Reader, SqlHelperError> {
        self.run(command, query::execute_reader).await
    }

    async fn read_next(
        &mut self,
        reader: &mut Self::Reader,
    ) -> Result<Option<CustomDbRow>, SqlHelperError> {
        Ok(reader.pop_front())
    }

    async fn execute_scalar(
        &mut self,
        command: &mut Command,
    ) -> Result<Option<RowValues>, SqlHelperError> {
        self.run(command, query::execute_scalar).await
    }
}
