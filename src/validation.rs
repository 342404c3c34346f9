//! Caller-input checks run before any connection is checked out.
//!
//! Table and column names are spliced into SQL text, so they must be plain identifiers.
//! Everything else a record could get wrong (absent or by-value records) is ruled out by the
//! `&mut` signatures of the engine operations.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::filter::Filter;
use crate::record::{Changeset, Record, primary_key_index};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap_or_else(|e| panic!("identifier pattern: {e}"))
});

/// # Errors
/// Returns `ValidationError::InvalidIdentifier` for anything but a (optionally
/// schema-qualified) plain identifier.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(name.to_string()))
    }
}

/// Table name plus the record's declared columns and primary key.
///
/// # Errors
/// Returns the first identifier or primary-key problem found.
pub fn validate_target<R: Record>(table: &str) -> Result<Option<usize>, ValidationError> {
    validate_identifier(table)?;
    for column in R::columns() {
        validate_identifier(column)?;
    }
    primary_key_index::<R>()
}

/// # Errors
/// Returns `ValidationError::ColumnCount` when `values()` and `columns()` disagree.
pub fn validate_record<R: Record>(record: &R) -> Result<(), ValidationError> {
    let columns = R::columns().len();
    let values = record.values().len();
    if columns == values {
        Ok(())
    } else {
        Err(ValidationError::ColumnCount { columns, values })
    }
}

/// # Errors
/// Returns `ValidationError::NullValue` for an empty slice, `InvalidBatchSize` for a zero batch
/// size, or the first per-record problem.
pub fn validate_batch<R: Record>(records: &[R], batch_size: usize) -> Result<(), ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::NullValue);
    }
    if batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize);
    }
    records.iter().try_for_each(validate_record)
}

/// # Errors
/// Returns `ValidationError::NullValue` for an empty changeset or `InvalidIdentifier` for a bad
/// column name.
pub fn validate_changeset(patch: &Changeset) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::NullValue);
    }
    patch.columns().try_for_each(validate_identifier)
}

/// Updates and deletes must name the rows they touch.
///
/// # Errors
/// Returns `ValidationError::MissingWhereClause` for an empty filter.
pub fn validate_scoped(filter: &Filter) -> Result<(), ValidationError> {
    if filter.is_empty() {
        Err(ValidationError::MissingWhereClause)
    } else {
        Ok(())
    }
}
