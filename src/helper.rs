//! The `SqlHelper` façade.
//!
//! Every entry point funnels into [`executor::execute`](crate::executor::execute). The
//! explicit-parameter forms take a command type, text and `&mut [DbParameter]`; the `_sp`
//! forms take a stored procedure name and positional values, resolve the procedure's
//! signature through the [`ParameterCache`] and bind the values by position.
//!
//! ```rust,no_run
//! use sql_helper::prelude::*;
//! use sql_helper::sqlite::SqliteDriver;
//!
//! # async fn demo() -> Result<(), SqlHelperError> {
//! let helper = SqlHelper::new(SqliteDriver);
//! let mut conn = helper.connect("orders.db")?;
//!
//! helper
//!     .execute_non_query(&mut conn, CommandType::Text, "CREATE TABLE t (id INTEGER)", &mut [])
//!     .await?;
//! let count = helper
//!     .execute_scalar(&mut conn, CommandType::Text, "SELECT COUNT(*) FROM t", &mut [])
//!     .await?;
//! assert_eq!(count, Some(RowValues::Int(0)));
//! # Ok(()) }
//! ```

use std::sync::Arc;

use crate::cache::ParameterCache;
use crate::config::HelperOptions;
use crate::driver::Driver;
use crate::error::SqlHelperError;
use crate::executor::{self, ConnectionTarget, ExecutionOutcome, ExecutionShape, RowCursor};
use crate::parameters::{DbParameter, assign_parameter_values};
use crate::results::DataSet;
use crate::types::{CommandType, RowValues};

type Conn<D> = <D as Driver>::Connection;

/// Command execution helper bound to one driver and one parameter cache.
///
/// The cache is injected rather than global: helpers built with
/// [`with_cache`](Self::with_cache) over the same `Arc` share discovered signatures.
pub struct SqlHelper<D: Driver> {
    driver: D,
    cache: Arc<ParameterCache>,
    options: HelperOptions,
}

impl<D: Driver> std::fmt::Debug for SqlHelper<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlHelper")
            .field("driver", &"<Driver>")
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish()
    }
}

impl<D: Driver> SqlHelper<D> {
    /// Helper with default options and a cache of its own.
    pub fn new(driver: D) -> Self {
        Self::with_cache(driver, Arc::new(ParameterCache::new()))
    }

    pub fn with_cache(driver: D, cache: Arc<ParameterCache>) -> Self {
        Self {
            driver,
            cache,
            options: HelperOptions::default(),
        }
    }

    /// Helper with a fresh cache pre-seeded from `options.parameter_seeds`.
    pub fn with_options(driver: D, options: HelperOptions) -> Self {
        let cache = Arc::new(ParameterCache::new());
        for seed in &options.parameter_seeds {
            cache.cache_parameter_set(
                &seed.connection_string,
                &seed.command_text,
                seed.parameters.clone(),
            );
        }
        Self {
            driver,
            cache,
            options,
        }
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ParameterCache> {
        &self.cache
    }

    #[must_use]
    pub fn options(&self) -> &HelperOptions {
        &self.options
    }

    /// A closed connection for `connection_string`, for use with the caller-connection forms.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` if the driver rejects the connection string.
    pub fn connect(&self, connection_string: &str) -> Result<Conn<D>, SqlHelperError> {
        self.driver.create_connection(connection_string)
    }

    /// Signature of `procedure_name`, discovered on first use.
    ///
    /// # Errors
    /// Returns `SqlHelperError::DiscoveryError` if discovery fails.
    pub async fn get_parameter_set(
        &self,
        connection_string: &str,
        procedure_name: &str,
        include_return_value: bool,
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        self.cache
            .get_parameter_set(
                &self.driver,
                connection_string,
                procedure_name,
                include_return_value,
            )
            .await
    }

    /// Resolve the procedure's signature and bind `values` by position.
    ///
    /// With no values there is nothing to bind and no discovery takes place.
    async fn bind_positional(
        &self,
        connection_string: &str,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut parameters = self
            .get_parameter_set(connection_string, procedure_name, false)
            .await?;
        assign_parameter_values(&mut parameters, values)?;
        Ok(parameters)
    }

    /// Execute a command in any shape with explicit parameters.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn execute<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        shape: ExecutionShape,
        command_type: CommandType,
        command_text: &str,
        parameters: &mut [DbParameter],
    ) -> Result<ExecutionOutcome<'a, Conn<D>>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        executor::execute(
            &self.driver,
            target.into(),
            shape,
            command_type,
            command_text,
            self.options.command_timeout,
            parameters,
        )
        .await
    }

    /// Execute a stored procedure in any shape with positional values.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ArgumentCountMismatch` before anything is executed if the
    /// number of values differs from the procedure's parameter count,
    /// `SqlHelperError::DiscoveryError` if the signature cannot be discovered, and driver
    /// errors unchanged.
    pub async fn execute_sp<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        shape: ExecutionShape,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<ExecutionOutcome<'a, Conn<D>>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        let target = target.into();
        let connection_string = target.connection_string().to_string();
        let mut parameters = self
            .bind_positional(&connection_string, procedure_name, values)
            .await?;
        executor::execute(
            &self.driver,
            target,
            shape,
            CommandType::StoredProcedure,
            procedure_name,
            self.options.command_timeout,
            &mut parameters,
        )
        .await
    }

    /// Execute a command that returns no result set; returns the rows affected.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn execute_non_query<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        command_type: CommandType,
        command_text: &str,
        parameters: &mut [DbParameter],
    ) -> Result<usize, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute(target, ExecutionShape::NonQuery, command_type, command_text, parameters)
            .await?
            .into_rows_affected()
    }

    /// Positional-value form of [`execute_non_query`](Self::execute_non_query).
    ///
    /// Output parameters and the return value are not reachable through this form.
    ///
    /// # Errors
    /// See [`execute_sp`](Self::execute_sp).
    pub async fn execute_non_query_sp<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<usize, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute_sp(target, ExecutionShape::NonQuery, procedure_name, values)
            .await?
            .into_rows_affected()
    }

    /// Execute a command and materialize every result set it returns.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn execute_dataset<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        command_type: CommandType,
        command_text: &str,
        parameters: &mut [DbParameter],
    ) -> Result<DataSet, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute(target, ExecutionShape::Tabular, command_type, command_text, parameters)
            .await?
            .into_data_set()
    }

    /// Positional-value form of [`execute_dataset`](Self::execute_dataset).
    ///
    /// # Errors
    /// See [`execute_sp`](Self::execute_sp).
    pub async fn execute_dataset_sp<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<DataSet, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute_sp(target, ExecutionShape::Tabular, procedure_name, values)
            .await?
            .into_data_set()
    }

    /// Execute a command and return a cursor over its rows.
    ///
    /// For a connection-string target the cursor owns the connection and closing the
    /// cursor closes it. Await [`RowCursor::close`] (or
    /// [`RowCursor::into_result_set`]) for an orderly shutdown: dropping the cursor skips
    /// [`DbConnection::close`](crate::driver::DbConnection::close) and leaves the connection
    /// to the driver's own `Drop`.
    ///
    /// # Errors
    /// Driver errors are returned unchanged; a connection opened for the call is closed first.
    pub async fn execute_reader<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        command_type: CommandType,
        command_text: &str,
        parameters: &mut [DbParameter],
    ) -> Result<RowCursor<'a, Conn<D>>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute(target, ExecutionShape::Cursor, command_type, command_text, parameters)
            .await?
            .into_cursor()
    }

    /// Positional-value form of [`execute_reader`](Self::execute_reader).
    ///
    /// # Errors
    /// See [`execute_sp`](Self::execute_sp).
    pub async fn execute_reader_sp<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<RowCursor<'a, Conn<D>>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute_sp(target, ExecutionShape::Cursor, procedure_name, values)
            .await?
            .into_cursor()
    }

    /// Execute a command and return the first column of the first row, `None` if no row.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn execute_scalar<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        command_type: CommandType,
        command_text: &str,
        parameters: &mut [DbParameter],
    ) -> Result<Option<RowValues>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute(target, ExecutionShape::Scalar, command_type, command_text, parameters)
            .await?
            .into_scalar()
    }

    /// Positional-value form of [`execute_scalar`](Self::execute_scalar).
    ///
    /// # Errors
    /// See [`execute_sp`](Self::execute_sp).
    pub async fn execute_scalar_sp<'a>(
        &self,
        target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        procedure_name: &str,
        values: &[RowValues],
    ) -> Result<Option<RowValues>, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        self.execute_sp(target, ExecutionShape::Scalar, procedure_name, values)
            .await?
            .into_scalar()
    }

    /// Audited DELETE (stamp the rows with a user before deleting them). Not supported.
    ///
    /// # Errors
    /// Always returns `SqlHelperError::Unimplemented`; nothing is executed.
    #[allow(clippy::unused_async)]
    pub async fn execute_delete_query<'a>(
        &self,
        _target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        _delete_text: &str,
        _user_id: i64,
    ) -> Result<usize, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        Err(SqlHelperError::Unimplemented(
            "execute_delete_query".to_string(),
        ))
    }

    /// `FOR XML` result streaming. Not supported.
    ///
    /// # Errors
    /// Always returns `SqlHelperError::Unimplemented`; nothing is executed.
    #[allow(clippy::unused_async)]
    pub async fn execute_xml_reader<'a>(
        &self,
        _target: impl Into<ConnectionTarget<'a, Conn<D>>>,
        _command_type: CommandType,
        _command_text: &str,
        _parameters: &mut [DbParameter],
    ) -> Result<String, SqlHelperError>
    where
        Conn<D>: 'a,
    {
        Err(SqlHelperError::Unimplemented(
            "execute_xml_reader".to_string(),
        ))
    }
}
