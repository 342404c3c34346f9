use crate::error::{EngineError, ValidationError};
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// A caller-defined row shape the engine can write and read without knowing its fields.
///
/// The engine only ever sees records through `&mut` references, so the destination of a read
/// and the source of a write are always live, caller-owned storage.
///
/// ```rust
/// use crud_engine::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     en_name: String,
///     status: i64,
/// }
///
/// impl Record for User {
///     fn columns() -> &'static [&'static str] {
///         &["id", "en_name", "status"]
///     }
///     fn primary_key() -> Option<&'static str> {
///         Some("id")
///     }
///     fn values(&self) -> Vec<RowValues> {
///         vec![self.id.into(), (&self.en_name).into(), self.status.into()]
///     }
///     fn from_row(row: &CustomDbRow) -> Result<Self, EngineError> {
///         Ok(Self {
///             id: row.get_int("id")?,
///             en_name: row.get_text("en_name")?,
///             status: row.get_int("status")?,
///         })
///     }
///     fn set_primary_key(&mut self, key: &RowValues) {
///         if let Some(id) = key.as_int() {
///             self.id = *id;
///         }
///     }
/// }
/// ```
pub trait Record: Send + Sync + Sized + 'static {
    /// Column names, in the order [`Record::values`] yields them.
    fn columns() -> &'static [&'static str];

    /// Primary key column, if the table has one. Reads order by it and inserts backfill it.
    fn primary_key() -> Option<&'static str> {
        None
    }

    fn values(&self) -> Vec<RowValues>;

    /// Decode one result row.
    ///
    /// # Errors
    /// Implementations return `EngineError::Decode` when a column is missing or mistyped.
    fn from_row(row: &CustomDbRow) -> Result<Self, EngineError>;

    /// Receives the key the database generated for this record on insert.
    ///
    /// Within one multi-row insert, integer keys are matched to records in ascending order.
    /// Non-integer generated keys are matched in the order the store returns them, which is
    /// only reliable for single-row chunks.
    fn set_primary_key(&mut self, _key: &RowValues) {}
}

/// Position of the declared primary key within `R::columns()`.
pub(crate) fn primary_key_index<R: Record>() -> Result<Option<usize>, ValidationError> {
    match R::primary_key() {
        None => Ok(None),
        Some(pk) => R::columns()
            .iter()
            .position(|col| *col == pk)
            .map(Some)
            .ok_or_else(|| ValidationError::UnknownPrimaryKey(pk.to_string())),
    }
}

/// Ordered column assignments for an `UPDATE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    assignments: Vec<(String, RowValues)>,
}

impl Changeset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a column; assigning the same column twice keeps the last value.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        let value = value.into();
        match self.assignments.iter_mut().find(|(col, _)| col == column) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((column.to_string(), value)),
        }
        self
    }

    /// Only the non-zero fields of `record`; the primary key is never part of the patch.
    #[must_use]
    pub fn from_record<R: Record>(record: &R) -> Self {
        let pk = R::primary_key();
        let assignments = R::columns()
            .iter()
            .zip(record.values())
            .filter(|(col, value)| Some(**col) != pk && !value.is_zero())
            .map(|(col, value)| ((*col).to_string(), value))
            .collect();
        Self { assignments }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(col, _)| col.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.assignments.iter().map(|(col, v)| (col.as_str(), v))
    }
}

impl<R: Record> From<&R> for Changeset {
    fn from(record: &R) -> Self {
        Changeset::from_record(record)
    }
}

impl<R: Record> From<&mut R> for Changeset {
    fn from(record: &mut R) -> Self {
        Changeset::from_record(&*record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Account {
        id: i64,
        name: String,
        status: i64,
    }

    impl Record for Account {
        fn columns() -> &'static [&'static str] {
            &["id", "name", "status"]
        }
        fn primary_key() -> Option<&'static str> {
            Some("id")
        }
        fn values(&self) -> Vec<RowValues> {
            vec![self.id.into(), (&self.name).into(), self.status.into()]
        }
        fn from_row(row: &CustomDbRow) -> Result<Self, EngineError> {
            Ok(Self {
                id: row.get_int("id")?,
                name: row.get_text("name")?,
                status: row.get_int("status")?,
            })
        }
    }

    struct Orphan;

    impl Record for Orphan {
        fn columns() -> &'static [&'static str] {
            &["a"]
        }
        fn primary_key() -> Option<&'static str> {
            Some("id")
        }
        fn values(&self) -> Vec<RowValues> {
            vec![RowValues::Null]
        }
        fn from_row(_row: &CustomDbRow) -> Result<Self, EngineError> {
            Ok(Orphan)
        }
    }

    #[test]
    fn changeset_from_record_keeps_non_zero_fields() {
        let patch = Changeset::from(&Account {
            id: 9,
            name: String::new(),
            status: 2,
        });
        assert_eq!(patch.columns().collect::<Vec<_>>(), vec!["status"]);
    }

    #[test]
    fn explicit_changeset_can_assign_zero() {
        let patch = Changeset::new().set("status", 0_i64).set("name", "x").set("status", 3_i64);
        let pairs: Vec<_> = patch.iter().map(|(c, v)| (c.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![
                ("status".to_string(), RowValues::Int(3)),
                ("name".to_string(), RowValues::Text("x".into())),
            ]
        );
    }

    #[test]
    fn primary_key_must_be_a_column() {
        assert_eq!(primary_key_index::<Account>(), Ok(Some(0)));
        assert_eq!(
            primary_key_index::<Orphan>(),
            Err(ValidationError::UnknownPrimaryKey("id".into()))
        );
    }
}
