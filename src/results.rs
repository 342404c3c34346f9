use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::EngineError;
use crate::types::RowValues;

/// A row from a database query result
///
/// Column names and the name→index map are shared by every row of one result set.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    column_index: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a row with its own column index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            rows,
            column_index,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied().or_else(|| {
            // Postgres folds unquoted identifiers to lower case.
            self.column_names
                .iter()
                .position(|col| col.eq_ignore_ascii_case(column_name))
        })
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Value of a column, failing with [`EngineError::Decode`] when the column is absent.
    ///
    /// # Errors
    /// Returns `EngineError::Decode` if the result set has no such column.
    pub fn value(&self, column_name: &str) -> Result<&RowValues, EngineError> {
        self.get(column_name)
            .ok_or_else(|| EngineError::Decode(format!("column {column_name:?} not in result set")))
    }

    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or not an integer.
    pub fn get_int(&self, column_name: &str) -> Result<i64, EngineError> {
        let value = self.value(column_name)?;
        value
            .as_int()
            .copied()
            .ok_or_else(|| mismatch(column_name, "an integer", value))
    }

    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or not text.
    pub fn get_text(&self, column_name: &str) -> Result<String, EngineError> {
        let value = self.value(column_name)?;
        value
            .as_text()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(column_name, "text", value))
    }

    /// Text column that may be NULL.
    ///
    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or holds a non-text value.
    pub fn get_optional_text(&self, column_name: &str) -> Result<Option<String>, EngineError> {
        match self.value(column_name)? {
            RowValues::Null => Ok(None),
            RowValues::Text(s) => Ok(Some(s.clone())),
            other => Err(mismatch(column_name, "text or NULL", other)),
        }
    }

    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or not a boolean (or 0/1).
    pub fn get_bool(&self, column_name: &str) -> Result<bool, EngineError> {
        let value = self.value(column_name)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(column_name, "a boolean", value))
    }

    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or not numeric.
    pub fn get_float(&self, column_name: &str) -> Result<f64, EngineError> {
        let value = self.value(column_name)?;
        value
            .as_float()
            .ok_or_else(|| mismatch(column_name, "a float", value))
    }

    /// # Errors
    /// Returns `EngineError::Decode` if the column is absent or not a timestamp.
    pub fn get_timestamp(&self, column_name: &str) -> Result<NaiveDateTime, EngineError> {
        let value = self.value(column_name)?;
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(column_name, "a timestamp", value))
    }
}

fn mismatch(column_name: &str, expected: &str, found: &RowValues) -> EngineError {
    EngineError::Decode(format!(
        "column {column_name:?}: expected {expected}, found {found:?}"
    ))
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

/// A result set from a database query
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
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
    /// # Errors
    /// Returns `EngineError::ExecutionError` if column names were never set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) -> Result<(), EngineError> {
        let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        else {
            return Err(EngineError::ExecutionError(
                "No column names available".to_string(),
            ));
        };
        self.results.push(CustomDbRow {
            column_names: Arc::clone(column_names),
            rows: row_values,
            column_index: Arc::clone(column_index),
        });
        self.rows_affected += 1;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut rs = ResultSet::with_capacity(1);
        rs.set_column_names(Arc::new(vec![
            "id".to_string(),
            "en_name".to_string(),
            "status".to_string(),
            "note".to_string(),
        ]));
        rs.add_row_values(vec![
            RowValues::Int(7),
            RowValues::Text("summer".into()),
            RowValues::Int(1),
            RowValues::Null,
        ])
        .expect("columns set");
        rs
    }

    #[test]
    fn typed_getters_decode_by_name() {
        let rs = sample();
        let row = &rs.results[0];
        assert_eq!(row.get_int("id").unwrap(), 7);
        assert_eq!(row.get_text("en_name").unwrap(), "summer");
        assert!(row.get_bool("status").unwrap());
        assert_eq!(row.get_optional_text("note").unwrap(), None);
        assert_eq!(row.get_column_index("EN_NAME"), Some(1));
    }

    #[test]
    fn decode_errors_name_the_column() {
        let rs = sample();
        let err = rs.results[0].get_int("en_name").unwrap_err();
        assert!(matches!(err, EngineError::Decode(ref msg) if msg.contains("en_name")));
        assert!(matches!(rs.results[0].get_text("missing"), Err(EngineError::Decode(_))));
    }

    #[test]
    fn rows_require_column_names() {
        let mut rs = ResultSet::default();
        assert!(rs.add_row_values(vec![RowValues::Null]).is_err());
        assert!(rs.is_empty());
    }
}
