use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tiberius::{Config, Query};
use tracing::debug;

use super::client::{MssqlClient, create_mssql_client};
use super::config::parse_connection_string;
use super::derive;
use super::params::bind_query_params;
use super::procedure::ProcedureBatch;
use super::query::{build_result_sets, convert_affected_rows};
use crate::command::Command;
use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::parameters::DbParameter;
use crate::results::{CustomDbRow, DataSet, ResultSet};
use crate::types::{CommandType, ConnectionState, RowValues};

/// Driver for SQL Server. Connection strings use the ADO.NET format.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDriver;

impl Driver for MssqlDriver {
    type Connection = MssqlConnection;

    fn create_connection(&self, connection_string: &str) -> Result<MssqlConnection, SqlHelperError> {
        Ok(MssqlConnection {
            connection_string: connection_string.to_string(),
            config: parse_connection_string(connection_string)?,
            client: None,
        })
    }
}

/// One TDS session. The session is established by [`open`](DbConnection::open).
pub struct MssqlConnection {
    connection_string: String,
    config: Config,
    client: Option<MssqlClient>,
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("addr", &self.config.get_addr())
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl MssqlConnection {
    fn client(&mut self) -> Result<&mut MssqlClient, SqlHelperError> {
        self.client.as_mut().ok_or_else(|| {
            SqlHelperError::ConnectionError("SQL Server connection is not open".to_string())
        })
    }

    async fn execute_batch(&mut self, sql: &'static str) -> Result<(), SqlHelperError> {
        Query::new(sql).execute(self.client()?).await?;
        Ok(())
    }

    /// Run the command and collect every result set it returns. Stored procedure output
    /// values are written into the command's parameters.
    async fn run(&mut self, command: &mut Command) -> Result<(Vec<ResultSet>, usize), SqlHelperError> {
        let timeout = command.timeout;
        let client = self.client()?;
        bounded(timeout, run_command(client, command)).await
    }
}

async fn run_command(
    client: &mut MssqlClient,
    command: &mut Command,
) -> Result<(Vec<ResultSet>, usize), SqlHelperError> {
    match command.command_type {
        CommandType::Text => {
            let query = bind_query_params(command.text.as_str(), command.parameters.as_slice());
            let result_sets = build_result_sets(query.query(client).await?).await?;
            let rows = result_sets.iter().map(ResultSet::len).sum();
            Ok((result_sets, rows))
        }
        CommandType::StoredProcedure => {
            let batch = ProcedureBatch::new(&command.text, command.parameters.as_slice());
            let mut result_sets = build_result_sets(batch.query().query(client).await?).await?;
            let status = result_sets.pop().ok_or_else(|| {
                SqlHelperError::ExecutionError(
                    "stored procedure batch returned no status row".to_string(),
                )
            })?;
            let rows = batch.apply_status(&status, &mut command.parameters)?;
            Ok((result_sets, rows))
        }
    }
}

async fn bounded<T, F>(timeout: Option<Duration>, work: F) -> Result<T, SqlHelperError>
where
    F: Future<Output = Result<T, SqlHelperError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
            SqlHelperError::ExecutionError(format!("command timed out after {limit:?}"))
        })?,
        None => work.await,
    }
}

#[async_trait]
impl DbConnection for MssqlConnection {
    /// The first result set, buffered: a tiberius stream borrows the client.
    type Reader = VecDeque<CustomDbRow>;

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn state(&self) -> ConnectionState {
        if self.client.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    async fn open(&mut self) -> Result<(), SqlHelperError> {
        if self.client.is_none() {
            self.client = Some(create_mssql_client(self.config.clone()).await?);
            debug!(addr = %self.config.get_addr(), "SQL Server session opened");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlHelperError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    async fn begin_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("BEGIN TRANSACTION").await
    }

    async fn commit_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("COMMIT TRANSACTION").await
    }

    async fn rollback_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.execute_batch("ROLLBACK TRANSACTION").await
    }

    async fn execute_non_query(&mut self, command: &mut Command) -> Result<usize, SqlHelperError> {
        if command.command_type == CommandType::StoredProcedure {
            return self.run(command).await.map(|(_, rows)| rows);
        }
        let timeout = command.timeout;
        let client = self.client()?;
        let query = bind_query_params(command.text.as_str(), command.parameters.as_slice());
        let result = bounded(timeout, async {
            query.execute(client).await.map_err(SqlHelperError::from)
        })
        .await?;
        convert_affected_rows(result.rows_affected().iter().sum())
    }

    async fn execute_tabular(&mut self, command: &mut Command) -> Result<DataSet, SqlHelperError> {
        let (tables, _) = self.run(command).await?;
        Ok(DataSet { tables })
    }

    async fn execute_reader(
        &mut self,
        command: &mut Command,
    ) -> Result<Self::Reader, SqlHelperError> {
        let (tables, _) = self.run(command).await?;
        Ok(tables
            .into_iter()
            .next()
            .map(|table| table.results.into())
            .unwrap_or_default())
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
        let (tables, _) = self.run(command).await?;
        Ok(tables.first().and_then(ResultSet::first_value).cloned())
    }

    async fn derive_parameters(
        &mut self,
        procedure_name: &str,
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        derive::derive_parameters(self.client()?, procedure_name).await
    }
}
