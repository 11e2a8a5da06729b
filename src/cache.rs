//! Stored procedure parameter signature cache.
//!
//! Signatures are discovered lazily through the driver and kept for the lifetime of the
//! cache. Every read hands back an independent copy, so callers can bind values into it
//! without touching what other callers will receive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::driver::{DbConnection, Driver};
use crate::error::SqlHelperError;
use crate::parameters::{DbParameter, ParameterDirection};

const RETURN_VALUE_SUFFIX: &str = ":include ReturnValue Parameter";

/// Thread-safe map from `(connection, procedure, include-return-value)` to a signature.
///
/// Two callers missing on the same key at the same time may both run discovery; the map
/// stays consistent and the last writer wins. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ParameterCache {
    entries: Mutex<HashMap<String, Arc<Vec<DbParameter>>>>,
}

impl ParameterCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(connection_string: &str, command_text: &str) -> String {
        format!("{connection_string}:{command_text}")
    }

    fn signature_key(connection_string: &str, procedure_name: &str, include_return_value: bool) -> String {
        let mut key = Self::key(connection_string, procedure_name);
        if include_return_value {
            key.push_str(RETURN_VALUE_SUFFIX);
        }
        key
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Vec<DbParameter>>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            // Clear the poison and continue with the recovered data
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lookup(&self, key: &str) -> Option<Arc<Vec<DbParameter>>> {
        self.lock().get(key).cloned()
    }

    /// Store `parameters` for `command_text`, replacing any existing entry. No discovery.
    pub fn cache_parameter_set(
        &self,
        connection_string: &str,
        command_text: &str,
        parameters: Vec<DbParameter>,
    ) {
        let key = Self::key(connection_string, command_text);
        debug!(command_text, count = parameters.len(), "seeding parameter cache");
        self.lock().insert(key, Arc::new(parameters));
    }

    /// Copy of the cached signature for `command_text`, or `None` on a miss.
    /// Never triggers discovery.
    #[must_use]
    pub fn get_cached_parameter_set(
        &self,
        connection_string: &str,
        command_text: &str,
    ) -> Option<Vec<DbParameter>> {
        self.lookup(&Self::key(connection_string, command_text))
            .map(|cached| clone_parameters(&cached))
    }

    /// Copy of the signature for `procedure_name`, discovering and caching it on a miss.
    ///
    /// The entry for `include_return_value = false` shares its key with
    /// [`cache_parameter_set`](Self::cache_parameter_set), so seeded signatures are served
    /// without discovery.
    ///
    /// # Errors
    /// Returns `SqlHelperError::DiscoveryError` if the procedure cannot be introspected.
    pub async fn get_parameter_set<D: Driver>(
        &self,
        driver: &D,
        connection_string: &str,
        procedure_name: &str,
        include_return_value: bool,
    ) -> Result<Vec<DbParameter>, SqlHelperError> {
        let key = Self::signature_key(connection_string, procedure_name, include_return_value);

        if let Some(cached) = self.lookup(&key) {
            debug!(procedure_name, "parameter cache hit");
            return Ok(clone_parameters(&cached));
        }

        debug!(procedure_name, include_return_value, "parameter cache miss");
        let discovered = Arc::new(
            discover_parameter_set(driver, connection_string, procedure_name, include_return_value)
                .await?,
        );
        self.lock().insert(key, discovered.clone());

        Ok(clone_parameters(&discovered))
    }

    /// Number of cached signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Field-by-field copy; no descriptor in the result is shared with the cache.
fn clone_parameters(original: &[DbParameter]) -> Vec<DbParameter> {
    original.to_vec()
}

/// Open a short-lived connection and ask the driver for the procedure's parameters.
///
/// # Errors
/// Any failure while connecting or deriving is wrapped in `SqlHelperError::DiscoveryError`
/// with the driver error kept as its source.
pub async fn discover_parameter_set<D: Driver>(
    driver: &D,
    connection_string: &str,
    procedure_name: &str,
    include_return_value: bool,
) -> Result<Vec<DbParameter>, SqlHelperError> {
    debug!(procedure_name, "discovering stored procedure parameters");

    let mut conn = driver
        .create_connection(connection_string)
        .map_err(|e| SqlHelperError::discovery(procedure_name, e))?;
    conn.open()
        .await
        .map_err(|e| SqlHelperError::discovery(procedure_name, e))?;

    let derived = conn.derive_parameters(procedure_name).await;
    if let Err(e) = conn.close().await {
        debug!(procedure_name, error = %e, "closing discovery connection failed");
    }

    let mut parameters = derived.map_err(|e| SqlHelperError::discovery(procedure_name, e))?;
    if !include_return_value
        && parameters
            .first()
            .is_some_and(|p| p.direction == ParameterDirection::ReturnValue)
    {
        parameters.remove(0);
    }

    debug!(procedure_name, count = parameters.len(), "discovered parameters");
    Ok(parameters)
}
