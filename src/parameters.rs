use serde::{Deserialize, Serialize};

use crate::error::SqlHelperError;
use crate::types::RowValues;

/// Direction of a stored procedure or command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// True when the driver writes a value back into the parameter after execution.
    #[must_use]
    pub fn receives_value(self) -> bool {
        !matches!(self, ParameterDirection::Input)
    }
}

/// Declared type metadata of a parameter, as reported by the database.
///
/// `size` is in characters for character types and in bytes for binary types;
/// `-1` means `max`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamType {
    pub type_name: String,
    #[serde(default)]
    pub size: Option<i32>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
}

impl ParamType {
    #[must_use]
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// True when no type was declared (caller-built parameters usually leave it empty).
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.type_name.is_empty()
    }
}

/// One bindable slot of a command or stored procedure.
///
/// `value == None` means "no value assigned", which is not the same as
/// `Some(RowValues::Null)` (an explicit database null).
///
/// Cloning produces a fully independent descriptor; the parameter cache relies on
/// that to hand out copies callers can bind into.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DbParameter {
    pub name: String,
    #[serde(default)]
    pub direction: ParameterDirection,
    #[serde(default)]
    pub param_type: ParamType,
    #[serde(default)]
    pub value: Option<RowValues>,
}

impl DbParameter {
    /// Input parameter carrying a value.
    ///
    /// ```rust
    /// use sql_helper::prelude::*;
    ///
    /// let p = DbParameter::new("@prodid", 24);
    /// assert_eq!(p.direction, ParameterDirection::Input);
    /// assert_eq!(p.value, Some(RowValues::Int(24)));
    /// ```
    pub fn new(name: impl Into<String>, value: impl Into<RowValues>) -> Self {
        Self {
            name: name.into(),
            direction: ParameterDirection::Input,
            param_type: ParamType::default(),
            value: Some(value.into()),
        }
    }

    /// Parameter with no value assigned yet.
    pub fn unbound(
        name: impl Into<String>,
        direction: ParameterDirection,
        param_type: ParamType,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            param_type,
            value: None,
        }
    }

    pub fn output(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::unbound(name, ParameterDirection::Output, param_type)
    }

    pub fn input_output(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::unbound(name, ParameterDirection::InputOutput, param_type)
    }

    /// The conventional `@RETURN_VALUE` slot of a stored procedure.
    #[must_use]
    pub fn return_value() -> Self {
        Self::unbound(
            "@RETURN_VALUE",
            ParameterDirection::ReturnValue,
            ParamType::named("int"),
        )
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<RowValues>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Name without the driver's leading marker (`@`, `:` or `$`).
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches(['@', ':', '$'])
    }

    /// An `InputOutput` parameter with no value becomes an explicit database null so the
    /// procedure's own default is not substituted. Pure `Output` parameters are left alone.
    pub(crate) fn normalize_for_attach(&mut self) {
        if self.direction == ParameterDirection::InputOutput && self.value.is_none() {
            self.value = Some(RowValues::Null);
        }
    }
}

/// Ordered parameter collection owned by a [`Command`](crate::command::Command).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterCollection {
    items: Vec<DbParameter>,
}

impl ParameterCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: DbParameter) {
        self.items.push(parameter);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove and return the parameter at `index`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ParameterError` if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> Result<DbParameter, SqlHelperError> {
        if index >= self.items.len() {
            return Err(SqlHelperError::ParameterError(format!(
                "index {index} out of range for {} parameters",
                self.items.len()
            )));
        }
        Ok(self.items.remove(index))
    }

    /// Clone the parameters into `target`, starting at `target[0]`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ParameterError` if `target` is shorter than the collection.
    pub fn copy_to(&self, target: &mut [DbParameter]) -> Result<(), SqlHelperError> {
        if target.len() < self.items.len() {
            return Err(SqlHelperError::ParameterError(format!(
                "target holds {} parameters, collection has {}",
                target.len(),
                self.items.len()
            )));
        }
        target[..self.items.len()].clone_from_slice(&self.items);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DbParameter> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DbParameter> {
        self.items.get_mut(index)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&DbParameter> {
        self.items.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DbParameter> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DbParameter> {
        self.items.iter_mut()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DbParameter] {
        &self.items
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<DbParameter> {
        self.items
    }
}

impl From<Vec<DbParameter>> for ParameterCollection {
    fn from(items: Vec<DbParameter>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a ParameterCollection {
    type Item = &'a DbParameter;
    type IntoIter = std::slice::Iter<'a, DbParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Assign `values` to `parameters` by position.
///
/// # Errors
/// Returns `SqlHelperError::ArgumentCountMismatch` when the lengths differ; no parameter is
/// modified in that case.
pub fn assign_parameter_values(
    parameters: &mut [DbParameter],
    values: &[RowValues],
) -> Result<(), SqlHelperError> {
    if parameters.len() != values.len() {
        return Err(SqlHelperError::ArgumentCountMismatch {
            expected: parameters.len(),
            actual: values.len(),
        });
    }

    for (parameter, value) in parameters.iter_mut().zip(values) {
        parameter.value = Some(value.clone());
    }
    Ok(())
}
