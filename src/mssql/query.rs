use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures_util::TryStreamExt;
use tiberius::numeric::Numeric;
use tiberius::{QueryItem, QueryStream, Row};

use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Drain a query stream into one `ResultSet` per result set the server returned.
///
/// Statements that return no rows (DML, DECLARE) produce no entry.
///
/// # Errors
/// Returns the tiberius error raised while reading the stream.
pub async fn build_result_sets(
    mut stream: QueryStream<'_>,
) -> Result<Vec<ResultSet>, SqlHelperError> {
    let mut result_sets: Vec<ResultSet> = Vec::new();

    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) => {
                let column_names: Vec<String> =
                    meta.columns().iter().map(|col| col.name().to_string()).collect();
                let mut result_set = ResultSet::with_capacity(10);
                result_set.set_column_names(Arc::new(column_names));
                result_sets.push(result_set);
            }
            QueryItem::Row(row) => {
                let result_set = result_sets.last_mut().ok_or_else(|| {
                    SqlHelperError::ExecutionError(
                        "SQL Server sent a row before its column metadata".to_string(),
                    )
                })?;
                let mut row_values = Vec::with_capacity(row.len());
                for i in 0..row.len() {
                    row_values.push(extract_value(&row, i));
                }
                result_set.add_row_values(row_values);
            }
        }
    }

    Ok(result_sets)
}

/// Extract a value from a row at a specific index; NULL and unsupported types become
/// `RowValues::Null`.
pub(crate) fn extract_value(row: &Row, idx: usize) -> RowValues {
    if let Ok(Some(val)) = row.try_get::<u8, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i16, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return RowValues::Int(val);
    }

    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return RowValues::Float(f64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return RowValues::Float(val);
    }
    if let Ok(Some(val)) = row.try_get::<Numeric, _>(idx) {
        return RowValues::Float(f64::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return RowValues::Bool(val);
    }

    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return RowValues::Timestamp(val);
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDate, _>(idx) {
        return RowValues::Timestamp(NaiveDateTime::from(val));
    }

    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return RowValues::Text(val.to_string());
    }

    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return RowValues::Blob(val.to_vec());
    }

    RowValues::Null
}

/// Convert a server row count to `usize`.
///
/// # Errors
/// Returns `SqlHelperError::ExecutionError` if the count does not fit.
pub(crate) fn convert_affected_rows(rows_affected: u64) -> Result<usize, SqlHelperError> {
    usize::try_from(rows_affected).map_err(|e| {
        SqlHelperError::ExecutionError(format!("Invalid rows affected count: {e}"))
    })
}
