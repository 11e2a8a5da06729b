use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlHelperError {
    /// Positional values do not line up with the resolved parameter signature.
    #[error("Parameter count does not match parameter value count: expected {expected}, got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },

    /// Deriving the parameter signature of a stored procedure failed.
    #[error("Parameter discovery failed for `{procedure}`: {source}")]
    DiscoveryError {
        procedure: String,
        #[source]
        source: Box<SqlHelperError>,
    },

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlHelperError {
    pub(crate) fn discovery(procedure: &str, source: SqlHelperError) -> Self {
        SqlHelperError::DiscoveryError {
            procedure: procedure.to_string(),
            source: Box::new(source),
        }
    }

    /// True for the permanent capability gaps reported as `Unimplemented`.
    #[must_use]
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, SqlHelperError::Unimplemented(_))
    }
}
