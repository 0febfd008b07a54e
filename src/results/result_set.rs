use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::column::ColumnValue;
use super::row::{Row, index_columns};
use crate::codec::DecoderOptions;
use crate::error::DecodeError;

/// A result set from a database query
///
/// This struct represents the result of a database query,
/// containing the rows returned by the query and metadata.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<Row>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    ///
    /// Rows added before `set_column_names` get an empty column list.
    pub fn add_row_values(&mut self, values: Vec<ColumnValue>) {
        let names = self.column_names.clone().unwrap_or_default();
        let index = self.column_index.clone().unwrap_or_default();
        self.results.push(Row::with_index(names, index, values));
        self.rows_affected += 1;
    }

    /// Decode every row into `T`.
    ///
    /// # Errors
    /// Returns the first `DecodeError` hit.
    pub fn decode_all<T: DeserializeOwned>(
        &self,
        options: &DecoderOptions,
    ) -> Result<Vec<T>, DecodeError> {
        self.results.iter().map(|row| row.decode(options)).collect()
    }
}
