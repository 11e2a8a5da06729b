use std::borrow::Cow;

use tiberius::Query;

use crate::parameters::{DbParameter, ParameterDirection};
use crate::types::RowValues;

/// Bind one value as the next positional `@Pn` placeholder.
pub fn bind_value(query: &mut Query<'_>, value: &RowValues) {
    match value {
        RowValues::Int(i) => query.bind(*i),
        RowValues::Float(f) => query.bind(*f),
        RowValues::Text(s) => query.bind(s.clone()),
        RowValues::Bool(b) => query.bind(*b),
        RowValues::Timestamp(dt) => query.bind(*dt),
        RowValues::Null => query.bind(Option::<String>::None),
        RowValues::JSON(jsval) => query.bind(jsval.to_string()),
        RowValues::Blob(bytes) => query.bind(bytes.clone()),
    }
}

/// True for the directions whose value is sent to the server.
pub(crate) fn sends_value(direction: ParameterDirection) -> bool {
    matches!(
        direction,
        ParameterDirection::Input | ParameterDirection::InputOutput
    )
}

/// Build a query for a text command, binding every parameter that sends a value as
/// `@P1..@Pn` in collection order. Parameter names are not used; an unassigned value
/// binds as NULL.
pub fn bind_query_params<'a>(sql: impl Into<Cow<'a, str>>, parameters: &[DbParameter]) -> Query<'a> {
    let mut query = Query::new(sql);
    for parameter in parameters.iter().filter(|p| sends_value(p.direction)) {
        bind_value(&mut query, parameter.value.as_ref().unwrap_or(&RowValues::Null));
    }
    query
}
