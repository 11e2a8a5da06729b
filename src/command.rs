use std::time::Duration;

use crate::parameters::{DbParameter, ParameterCollection};
use crate::types::CommandType;

/// Driver-neutral command handed to a [`DbConnection`](crate::driver::DbConnection).
///
/// Drivers read the text, type and parameters, and write output / return values back
/// into `parameters` after execution.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub text: String,
    pub command_type: CommandType,
    /// Passed through to the driver; the helper itself enforces no deadline.
    pub timeout: Option<Duration>,
    /// Set when the command runs inside the connection's active transaction.
    pub in_transaction: bool,
    pub parameters: ParameterCollection,
}

impl Command {
    pub fn new(command_type: CommandType, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            command_type,
            ..Self::default()
        }
    }

    /// Attach caller parameters, normalizing unassigned `InputOutput` values to database null.
    pub(crate) fn attach_parameters(&mut self, parameters: &[DbParameter]) {
        for parameter in parameters {
            let mut attached = parameter.clone();
            attached.normalize_for_attach();
            self.parameters.add(attached);
        }
    }

    /// Copy bound and driver-written values back to the caller's parameters by position,
    /// then clear the collection so the caller's parameters can be attached again.
    pub(crate) fn detach_parameters(&mut self, parameters: &mut [DbParameter]) {
        for (caller, attached) in parameters.iter_mut().zip(self.parameters.iter()) {
            caller.value.clone_from(&attached.value);
        }
        self.parameters.clear();
    }
}
