//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::results::ResultSet;
use crate::types::RowValues;

/// Create a result set from column names and row values.
#[must_use]
pub fn create_test_table(column_names: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
    let mut table = ResultSet::with_capacity(rows.len());
    table.set_column_names(Arc::new(
        column_names.iter().map(|c| (*c).to_string()).collect(),
    ));
    for row in rows {
        table.add_row_values(row);
    }
    table
}
