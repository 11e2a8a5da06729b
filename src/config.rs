use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlHelperError;
use crate::parameters::DbParameter;

/// A parameter signature written into the cache up front, skipping discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeed {
    pub connection_string: String,
    pub command_text: String,
    pub parameters: Vec<DbParameter>,
}

/// Options applied by a [`SqlHelper`](crate::helper::SqlHelper).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelperOptions {
    /// Copied onto every command; the driver enforces it.
    pub command_timeout: Option<Duration>,
    pub parameter_seeds: Vec<ParameterSeed>,
}

#[derive(Deserialize)]
struct RawOptions {
    #[serde(default)]
    command_timeout_secs: Option<u64>,
    #[serde(default)]
    parameter_seeds: Vec<ParameterSeed>,
}

impl HelperOptions {
    #[must_use]
    pub fn builder() -> HelperOptionsBuilder {
        HelperOptionsBuilder::default()
    }

    /// Parse options from JSON.
    ///
    /// ```rust
    /// use sql_helper::prelude::*;
    ///
    /// let opts = HelperOptions::from_json_str(r#"{
    ///     "command_timeout_secs": 30,
    ///     "parameter_seeds": [{
    ///         "connection_string": "db1",
    ///         "command_text": "GetOrders",
    ///         "parameters": [{ "name": "@prodid", "direction": "Input" }]
    ///     }]
    /// }"#)?;
    /// assert_eq!(opts.command_timeout, Some(std::time::Duration::from_secs(30)));
    /// assert_eq!(opts.parameter_seeds[0].parameters[0].name, "@prodid");
    /// # Ok::<(), SqlHelperError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, SqlHelperError> {
        let raw: RawOptions = serde_json::from_str(json)
            .map_err(|e| SqlHelperError::ConfigError(format!("invalid helper options: {e}")))?;
        Ok(Self {
            command_timeout: raw.command_timeout_secs.map(Duration::from_secs),
            parameter_seeds: raw.parameter_seeds,
        })
    }

    /// Read and parse a JSON options file.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlHelperError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SqlHelperError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

/// Fluent builder for [`HelperOptions`].
#[derive(Debug, Clone, Default)]
pub struct HelperOptionsBuilder {
    opts: HelperOptions,
}

impl HelperOptionsBuilder {
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.opts.command_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn seed(
        mut self,
        connection_string: impl Into<String>,
        command_text: impl Into<String>,
        parameters: Vec<DbParameter>,
    ) -> Self {
        self.opts.parameter_seeds.push(ParameterSeed {
            connection_string: connection_string.into(),
            command_text: command_text.into(),
            parameters,
        });
        self
    }

    #[must_use]
    pub fn finish(self) -> HelperOptions {
        self.opts
    }
}
