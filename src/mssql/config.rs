use tiberius::Config as TiberiusConfig;

use crate::error::SqlHelperError;

/// Parse an ADO.NET style connection string
/// (`server=tcp:host,1433;database=db;user id=sa;password=...;TrustServerCertificate=true`).
///
/// # Errors
/// Returns `SqlHelperError::ConfigError` if tiberius rejects the string.
pub fn parse_connection_string(connection_string: &str) -> Result<TiberiusConfig, SqlHelperError> {
    TiberiusConfig::from_ado_string(connection_string).map_err(|e| {
        SqlHelperError::ConfigError(format!("invalid SQL Server connection string: {e}"))
    })
}
