use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::column::ColumnValue;
use crate::codec::{DecoderOptions, decode_row};
use crate::error::DecodeError;

/// A row from a database query result
///
/// Column names and the name-to-index map are shared by every row of a
/// result set.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<ColumnValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `values` - The values for this row, in column order
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<ColumnValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<ColumnValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&ColumnValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Whether the named column is present and NULL.
    #[must_use]
    pub fn is_null(&self, column_name: &str) -> bool {
        self.get(column_name).is_some_and(ColumnValue::is_null)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decode this row into `T`.
    ///
    /// # Errors
    /// Returns `DecodeError` if a declared field has no column or a column
    /// cannot be read as the field's type.
    pub fn decode<T: DeserializeOwned>(&self, options: &DecoderOptions) -> Result<T, DecodeError> {
        decode_row(self, options)
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // First occurrence wins for duplicated names.
        index.entry(name.clone()).or_insert(i);
    }
    index
}
