use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{Connection, Statement};

use super::params::bind_parameters;
use crate::command::Command;
use crate::error::SqlHelperError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::{CommandType, RowValues};

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlHelperError` if the value cannot be read.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlHelperError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// Prepare the command's single statement and bind its parameters.
///
/// # Errors
/// Returns `SqlHelperError::Unimplemented` for stored procedures, otherwise the rusqlite
/// error from preparing or binding.
pub(crate) fn prepare<'c>(
    conn: &'c Connection,
    command: &Command,
) -> Result<Statement<'c>, SqlHelperError> {
    if command.command_type == CommandType::StoredProcedure {
        return Err(SqlHelperError::Unimplemented(
            "SQLite has no stored procedures".to_string(),
        ));
    }
    let mut stmt = conn.prepare(&command.text)?;
    bind_parameters(&mut stmt, command.parameters.as_slice())?;
    Ok(stmt)
}

/// Run `func` with the command timeout as the connection's busy timeout, then put the
/// previous busy timeout back so it does not outlive the command.
///
/// # Errors
/// Returns the error from `func`, else any rusqlite error from switching the timeout.
fn with_busy_timeout<T>(
    conn: &Connection,
    timeout: Option<Duration>,
    func: impl FnOnce() -> Result<T, SqlHelperError>,
) -> Result<T, SqlHelperError> {
    let Some(timeout) = timeout else {
        return func();
    };
    let previous: i64 = conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
    conn.busy_timeout(timeout)?;
    let result = func();
    let restored = conn.busy_timeout(Duration::from_millis(u64::try_from(previous).unwrap_or(0)));
    let value = result?;
    restored?;
    Ok(value)
}

/// Build a result set from an already-bound statement.
///
/// # Errors
/// Returns the rusqlite error raised while stepping the statement.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlHelperError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

pub(crate) fn execute_non_query(conn: &Connection, command: &Command) -> Result<usize, SqlHelperError> {
    with_busy_timeout(conn, command.timeout, || {
        let mut stmt = prepare(conn, command)?;
        Ok(stmt.raw_execute()?)
    })
}

pub(crate) fn execute_tabular(conn: &Connection, command: &Command) -> Result<ResultSet, SqlHelperError> {
    with_busy_timeout(conn, command.timeout, || {
        let mut stmt = prepare(conn, command)?;
        build_result_set(&mut stmt)
    })
}

/// Rows are read up front: a rusqlite row iterator borrows its statement, which cannot
/// outlive this call.
pub(crate) fn execute_reader(
    conn: &Connection,
    command: &Command,
) -> Result<VecDeque<CustomDbRow>, SqlHelperError> {
    Ok(execute_tabular(conn, command)?.results.into())
}

pub(crate) fn execute_scalar(
    conn: &Connection,
    command: &Command,
) -> Result<Option<RowValues>, SqlHelperError> {
    Ok(execute_tabular(conn, command)?.first_value().cloned())
}
