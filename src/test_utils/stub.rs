use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::Command;
use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::parameters::DbParameter;
use crate::results::{CustomDbRow, DataSet, ResultSet};
use crate::types::{CommandType, ConnectionState, RowValues};

/// What the stub saw for one execute call.
#[derive(Debug, Clone)]
pub struct ExecutedCommand {
    pub shape: &'static str,
    pub connection_string: String,
    pub text: String,
    pub command_type: CommandType,
    pub in_transaction: bool,
    pub timeout: Option<Duration>,
    pub parameters: Vec<DbParameter>,
}

#[derive(Default)]
struct StubState {
    procedures: HashMap<String, Vec<DbParameter>>,
    tables: Vec<ResultSet>,
    scalar: Option<RowValues>,
    rows_affected: usize,
    outputs: HashMap<String, RowValues>,
    execute_error: Option<String>,
    open_error: Option<String>,
    opens: usize,
    closes: usize,
    commands_created: usize,
    derivations: Vec<String>,
    transaction_log: Vec<&'static str>,
    executed: Vec<ExecutedCommand>,
}

/// In-memory driver that records every call and answers with scripted results.
///
/// Clones share the same script and log, so a test can keep one handle for assertions
/// while the helper owns another.
#[derive(Clone, Default)]
pub struct StubDriver {
    state: Arc<Mutex<StubState>>,
}

impl StubDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a procedure and the parameters derivation reports for it
    /// (including the return value, if any, first).
    #[must_use]
    pub fn with_procedure(self, name: &str, parameters: Vec<DbParameter>) -> Self {
        self.state().procedures.insert(name.to_string(), parameters);
        self
    }

    /// Result set returned by tabular and reader executions. Call repeatedly for
    /// multiple result sets.
    #[must_use]
    pub fn with_table(self, table: ResultSet) -> Self {
        self.state().tables.push(table);
        self
    }

    #[must_use]
    pub fn with_scalar(self, value: RowValues) -> Self {
        self.state().scalar = Some(value);
        self
    }

    #[must_use]
    pub fn with_rows_affected(self, rows: usize) -> Self {
        self.state().rows_affected = rows;
        self
    }

    /// Value the "server" writes into the named non-input parameter after execution.
    #[must_use]
    pub fn with_output(self, name: &str, value: RowValues) -> Self {
        self.state().outputs.insert(name.to_string(), value);
        self
    }

    /// Make every execute call fail with `SqlHelperError::ExecutionError(message)`.
    #[must_use]
    pub fn failing_execution(self, message: &str) -> Self {
        self.state().execute_error = Some(message.to_string());
        self
    }

    /// Make every `open` fail with `SqlHelperError::ConnectionError(message)`.
    #[must_use]
    pub fn failing_open(self, message: &str) -> Self {
        self.state().open_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn opens(&self) -> usize {
        self.state().opens
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        self.state().closes
    }

    /// Commands built through `DbConnection::create_command`.
    #[must_use]
    pub fn commands_created(&self) -> usize {
        self.state().commands_created
    }

    /// Procedure names derivation was asked for, in call order.
    #[must_use]
    pub fn derivations(&self) -> Vec<String> {
        self.state().derivations.clone()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedCommand> {
        self.state().executed.clone()
    }

    #[must_use]
    pub fn transaction_log(&self) -> Vec<&'static str> {
        self.state().transaction_log.clone()
    }

    /// A closed connection sharing this driver's script and log.
    #[must_use]
    pub fn connection(&self, connection_string: &str) -> StubConnection {
        StubConnection {
            connection_string: connection_string.to_string(),
            state: ConnectionState::Closed,
            shared: self.state.clone(),
        }
    }
}

impl Driver for StubDriver {
    type Connection = StubConnection;

    fn create_connection(&self, connection_string: &str) -> Result<StubConnection, SqlHelperError> {
        if connection_string.is_empty() {
            return Err(SqlHelperError::ConfigError(
                "connection string is empty".to_string(),
            ));
        }
        Ok(self.connection(connection_string))
    }
}

pub struct StubConnection {
    connection_string: String,
    state: ConnectionState,
    shared: Arc<Mutex<StubState>>,
}

impl std::fmt::Debug for StubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubConnection")
            .field("connection_string", &self.connection_string)
            .field("state", &self.state)
            .finish()
    }
}

impl StubConnection {
    fn shared(&self) -> MutexGuard<'_, StubState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), SqlHelperError> {
        if self.state == ConnectionState::Open {
            Ok(())
        } else {
            Err(SqlHelperError::ConnectionError(
                "stub connection is not open".to_string(),
            ))
        }
    }

    fn record(&self, shape: &'static str, command: &mut Command) -> Result<(), SqlHelperError> {
        self.ensure_open()?;
        let mut shared = self.shared();
        shared.executed.push(ExecutedCommand {
            shape,
            connection_string: self.connection_string.clone(),
            text: command.text.clone(),
            command_type: command.command_type,
            in_transaction: command.in_transaction,
            timeout: command.timeout,
            parameters: command.parameters.as_slice().to_vec(),
        });
        if let Some(message) = &shared.execute_error {
            return Err(SqlHelperError::ExecutionError(message.clone()));
        }
        for parameter in command.parameters.iter_mut() {
            if parameter.direction.receives_value() {
                if let Some(value) = shared.outputs.get(&parameter.name) {
                    parameter.value = Some(value.clone());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DbConnection for StubConnection {
    type Reader = VecDeque<CustomDbRow>;

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn create_command(&self, command_type: CommandType, command_text: &str) -> Command {
        self.shared().commands_created += 1;
        Command::new(command_type, command_text)
    }

    async fn open(&mut self) -> Result<(), SqlHelperError> {
        let mut shared = self.shared();
        if let Some(message) = &shared.open_error {
            return Err(SqlHelperError::ConnectionError(message.clone()));
        }
        shared.opens += 1;
        drop(shared);
        self.state = ConnectionState::Open;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SqlHelperError> {
        if self.state == ConnectionState::Open {
            self.shared().closes += 1;
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    async fn begin_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.ensure_open()?;
        self.shared().transaction_log.push("begin");
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.ensure_open()?;
        self.shared().transaction_log.push("commit");
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<(), SqlHelperError> {
        self.ensure_open()?;
        self.shared().transaction_log.push("rollback");
        Ok(())
    }

    async fn execute_non_query(&mut self, command: &mut Command) -> Result<usize, SqlHelperError> {
        self.record("non_query", command)?;
        Ok(self.shared().rows_affected)
    }

    async fn execute_tabular(&mut self, command: &mut Command) -> Result<DataSet, SqlHelperError> {
        self.record("tabular", command)?;
        Ok(DataSet {
            tables: self.shared().tables.clone(),
        })
    }

    async fn execute_reader(
        &mut self,
        command: &mut Command,
    ) -> Result<Self::Reader, SqlHelperError> {
        self.record("reader", command)?;
        let rows = self
            .shared()
            .tables
            .first()
            .map(|table| table.results.iter().cloned().collect())
            .unwrap_or_default();
        Ok(rows)
    }

    async fn read_next(
        &mut self,
        reader: &mut Self::Reader,
    ) -> Result<Option<CustomDbRow>, SqlHelperError> {
        self.ensure_open()?;
        Ok(reader.pop_front())
    }

    async fn execute_scalar(
        &mut self,
        command: &mut Command,
    ) -> Result<Option<RowValues>, SqlHelperError> {
        self.record("scalar", command)?;
        Ok(self.shared().scalar.clone())
    }

    async fn derive_parameters(
        &mut self,
        procedure_name: &str,
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        self.ensure_open()?;
        let mut shared = self.shared();
        shared.derivations.push(procedure_name.to_string());
        shared.procedures.get(procedure_name).cloned().ok_or_else(|| {
            SqlHelperError::ExecutionError(format!(
                "Could not find stored procedure '{procedure_name}'"
            ))
        })
    }
}
