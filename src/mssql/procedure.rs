use std::fmt::Write as _;

use tiberius::Query;

use super::params::bind_value;
use crate::error::SqlHelperError;
use crate::parameters::{DbParameter, ParamType, ParameterCollection, ParameterDirection};
use crate::results::ResultSet;
use crate::types::RowValues;

const ROWS_COLUMN: &str = "__rows";

/// T-SQL batch running one stored procedure.
///
/// Input parameters are passed by name from positional placeholders. Output, input-output
/// and return-value parameters go through declared variables that a trailing status
/// `SELECT` reads back, together with `@@ROWCOUNT` of the `EXEC`:
///
/// ```sql
/// DECLARE @__p0 int;
/// DECLARE @__p2 decimal(18,2) = @P2;
/// EXEC @__p0 = UpdateTotals @id = @P1, @total = @__p2 OUTPUT;
/// SELECT @@ROWCOUNT AS [__rows], @__p0 AS [@RETURN_VALUE], @__p2 AS [@total];
/// ```
#[derive(Debug)]
pub(crate) struct ProcedureBatch {
    pub(crate) sql: String,
    values: Vec<RowValues>,
    /// Parameter index behind each status column after `__rows`.
    returned: Vec<usize>,
}

impl ProcedureBatch {
    pub(crate) fn new(procedure: &str, parameters: &[DbParameter]) -> Self {
        let mut declarations = String::new();
        let mut arguments = Vec::with_capacity(parameters.len());
        let mut status = format!("SELECT @@ROWCOUNT AS [{ROWS_COLUMN}]");
        let mut values = Vec::new();
        let mut returned = Vec::new();
        let mut return_variable = None;

        for (i, parameter) in parameters.iter().enumerate() {
            let name = parameter.bare_name();
            let variable = format!("@__p{i}");
            match parameter.direction {
                ParameterDirection::Input => {
                    values.push(parameter.value.clone().unwrap_or(RowValues::Null));
                    arguments.push(format!("@{name} = @P{}", values.len()));
                    continue;
                }
                ParameterDirection::InputOutput => {
                    values.push(parameter.value.clone().unwrap_or(RowValues::Null));
                    let _ = writeln!(
                        declarations,
                        "DECLARE {variable} {} = @P{};",
                        declared_type(&parameter.param_type),
                        values.len()
                    );
                    arguments.push(format!("@{name} = {variable} OUTPUT"));
                }
                ParameterDirection::Output => {
                    let _ = writeln!(
                        declarations,
                        "DECLARE {variable} {};",
                        declared_type(&parameter.param_type)
                    );
                    arguments.push(format!("@{name} = {variable} OUTPUT"));
                }
                ParameterDirection::ReturnValue => {
                    let _ = writeln!(declarations, "DECLARE {variable} int;");
                    return_variable = Some(variable.clone());
                }
            }
            let _ = write!(status, ", {variable} AS [@{name}]");
            returned.push(i);
        }

        let mut sql = declarations;
        sql.push_str("EXEC ");
        if let Some(variable) = return_variable {
            let _ = write!(sql, "{variable} = ");
        }
        sql.push_str(procedure);
        if !arguments.is_empty() {
            sql.push(' ');
            sql.push_str(&arguments.join(", "));
        }
        sql.push_str(";\n");
        sql.push_str(&status);
        sql.push(';');

        Self {
            sql,
            values,
            returned,
        }
    }

    pub(crate) fn query(&self) -> Query<'_> {
        let mut query = Query::new(self.sql.as_str());
        for value in &self.values {
            bind_value(&mut query, value);
        }
        query
    }

    /// Write the status row's variables into `parameters` and return the `EXEC` row count.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ExecutionError` if the status row is missing.
    pub(crate) fn apply_status(
        &self,
        status: &ResultSet,
        parameters: &mut ParameterCollection,
    ) -> Result<usize, SqlHelperError> {
        let row = status.results.first().ok_or_else(|| {
            SqlHelperError::ExecutionError("stored procedure status row is missing".to_string())
        })?;

        for (column, &index) in self.returned.iter().enumerate() {
            if let (Some(value), Some(parameter)) =
                (row.get_by_index(column + 1), parameters.get_mut(index))
            {
                parameter.value = Some(value.clone());
            }
        }

        Ok(match row.get_by_index(0) {
            Some(RowValues::Int(rows)) => usize::try_from(*rows).unwrap_or(0),
            _ => 0,
        })
    }
}

/// T-SQL type for a variable declaration. Undeclared types fall back to `sql_variant`.
fn declared_type(param_type: &ParamType) -> String {
    if param_type.is_unspecified() {
        return "sql_variant".to_string();
    }
    let name = param_type.type_name.to_ascii_lowercase();
    match name.as_str() {
        "char" | "varchar" | "nchar" | "nvarchar" | "binary" | "varbinary" => {
            match param_type.size {
                Some(size) if size > 0 => format!("{name}({size})"),
                _ if name.starts_with("var") || name == "nvarchar" => format!("{name}(max)"),
                _ => name,
            }
        }
        "decimal" | "numeric" => match (param_type.precision, param_type.scale) {
            (Some(precision), Some(scale)) => format!("{name}({precision},{scale})"),
            (Some(precision), None) => format!("{name}({precision})"),
            _ => name,
        },
        _ => name,
    }
}
