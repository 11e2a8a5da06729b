use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlHelperError;
use crate::parameters::{DbParameter, ParameterDirection};
use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

fn is_named(parameter: &DbParameter) -> bool {
    parameter.name.starts_with(['@', ':', '$'])
}

/// Bind the command's parameters to `stmt`.
///
/// Parameters named with a `:`, `@` or `$` marker bind to the matching named placeholder;
/// the rest bind by position. Output and return-value parameters have nothing to send and
/// are skipped. An unassigned value binds as NULL.
///
/// # Errors
/// Returns `SqlHelperError::ParameterError` for a named parameter the statement does not
/// declare, or the rusqlite error from binding.
pub fn bind_parameters(
    stmt: &mut Statement<'_>,
    parameters: &[DbParameter],
) -> Result<(), SqlHelperError> {
    let mut position = 0;
    for parameter in parameters {
        if !matches!(
            parameter.direction,
            ParameterDirection::Input | ParameterDirection::InputOutput
        ) {
            continue;
        }
        position += 1;

        let index = if is_named(parameter) {
            stmt.parameter_index(&parameter.name)?.ok_or_else(|| {
                SqlHelperError::ParameterError(format!(
                    "statement has no parameter named {}",
                    parameter.name
                ))
            })?
        } else {
            position
        };

        let value = parameter
            .value
            .as_ref()
            .map_or(Value::Null, row_value_to_sqlite_value);
        stmt.raw_bind_parameter(index, value)?;
    }
    Ok(())
}
