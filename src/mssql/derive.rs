use tiberius::Query;
use tracing::debug;

use super::client::MssqlClient;
use crate::error::SqlHelperError;
use crate::parameters::{DbParameter, ParamType, ParameterDirection};

/// Resolves only procedures: SQL, CLR and extended.
const PROCEDURE_ID_SQL: &str = "SELECT o.object_id FROM sys.objects AS o \
     WHERE o.object_id = OBJECT_ID(@P1) AND o.type IN ('P', 'PC', 'X')";

const PARAMETERS_SQL: &str = "SELECT p.name, TYPE_NAME(p.user_type_id), p.max_length, \
     p.precision, p.scale, p.is_output \
     FROM sys.parameters AS p \
     WHERE p.object_id = @P1 AND p.parameter_id > 0 \
     ORDER BY p.parameter_id";

/// One row of `sys.parameters`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CatalogParameter {
    pub name: String,
    pub type_name: String,
    pub max_length: i16,
    pub precision: u8,
    pub scale: u8,
    pub is_output: bool,
}

impl CatalogParameter {
    /// Output parameters are reported as `InputOutput`: the catalog cannot tell the two apart.
    pub(crate) fn into_parameter(self) -> DbParameter {
        let direction = if self.is_output {
            ParameterDirection::InputOutput
        } else {
            ParameterDirection::Input
        };
        let type_name = self.type_name.to_ascii_lowercase();
        let mut param_type = ParamType::named(type_name.as_str());
        match type_name.as_str() {
            // max_length is in bytes; nchar/nvarchar sizes are in characters
            "nchar" | "nvarchar" if self.max_length > 0 => {
                param_type = param_type.with_size(i32::from(self.max_length / 2));
            }
            "char" | "varchar" | "nchar" | "nvarchar" | "binary" | "varbinary" => {
                param_type = param_type.with_size(i32::from(self.max_length));
            }
            "decimal" | "numeric" => {
                param_type = param_type.with_precision(self.precision, self.scale);
            }
            _ => {}
        }
        DbParameter::unbound(self.name, direction, param_type)
    }
}

/// Derive the signature of `procedure` from the catalog: `@RETURN_VALUE` first, then the
/// declared parameters in declaration order.
///
/// # Errors
/// Returns `SqlHelperError::ExecutionError` if no procedure has that name (tables, views
/// and functions do not count), or the tiberius error from the catalog queries.
pub async fn derive_parameters(
    client: &mut MssqlClient,
    procedure: &str,
) -> Result<Vec<DbParameter>, SqlHelperError> {
    let mut lookup = Query::new(PROCEDURE_ID_SQL);
    lookup.bind(procedure.to_string());
    let object_id = match lookup.query(client).await?.into_row().await? {
        Some(row) => row.try_get::<i32, _>(0)?,
        None => None,
    };
    let object_id = object_id.ok_or_else(|| {
        SqlHelperError::ExecutionError(format!(
            "Could not find stored procedure '{procedure}'"
        ))
    })?;

    let mut catalog = Query::new(PARAMETERS_SQL);
    catalog.bind(object_id);
    let rows = catalog.query(client).await?.into_first_result().await?;

    let mut parameters = Vec::with_capacity(rows.len() + 1);
    parameters.push(DbParameter::return_value());
    for row in rows {
        let entry = CatalogParameter {
            name: row.try_get::<&str, _>(0)?.unwrap_or_default().to_string(),
            type_name: row.try_get::<&str, _>(1)?.unwrap_or_default().to_string(),
            max_length: row.try_get::<i16, _>(2)?.unwrap_or_default(),
            precision: row.try_get::<u8, _>(3)?.unwrap_or_default(),
            scale: row.try_get::<u8, _>(4)?.unwrap_or_default(),
            is_output: row.try_get::<bool, _>(5)?.unwrap_or_default(),
        };
        parameters.push(entry.into_parameter());
    }

    debug!(procedure, count = parameters.len(), "derived SQL Server parameters");
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, type_name: &str, max_length: i16, is_output: bool) -> CatalogParameter {
        CatalogParameter {
            name: name.to_string(),
            type_name: type_name.to_string(),
            max_length,
            precision: 0,
            scale: 0,
            is_output,
        }
    }

    #[test]
    fn output_parameters_become_input_output() {
        let p = entry("@count", "int", 4, true).into_parameter();
        assert_eq!(p.direction, ParameterDirection::InputOutput);
        assert_eq!(p.value, None);
        assert_eq!(p.param_type.size, None);
    }

    #[test]
    fn unicode_sizes_are_in_characters() {
        assert_eq!(
            entry("@name", "nvarchar", 80, false).into_parameter().param_type.size,
            Some(40)
        );
        assert_eq!(
            entry("@body", "NVARCHAR", -1, false).into_parameter().param_type.size,
            Some(-1)
        );
        assert_eq!(
            entry("@code", "varchar", 10, false).into_parameter().param_type.size,
            Some(10)
        );
    }

    #[test]
    fn lookup_only_matches_procedures() {
        assert!(PROCEDURE_ID_SQL.contains("FROM sys.objects"));
        assert!(PROCEDURE_ID_SQL.contains("o.type IN ('P', 'PC', 'X')"));
    }

    #[test]
    fn decimals_keep_precision_and_scale() {
        let mut e = entry("@total", "decimal", 9, false);
        e.precision = 18;
        e.scale = 2;
        let p = e.into_parameter();
        assert_eq!(p.param_type.precision, Some(18));
        assert_eq!(p.param_type.scale, Some(2));
    }
}
