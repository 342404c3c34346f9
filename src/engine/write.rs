use std::sync::Arc;

use crate::error::EngineError;
use crate::filter::Filter;
use crate::record::{Changeset, Record};
use crate::sql;
use crate::types::RowValues;
use crate::validation::{
    validate_batch, validate_changeset, validate_identifier, validate_scoped, validate_target,
};

use super::Engine;
use super::tx::Tx;

impl Engine {
    /// Insert one record inside a transaction.
    ///
    /// A primary key left at its zero value is generated by the database and written back
    /// into `record`.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` for a malformed table or record, or the store error
    /// of the failed insert (the transaction is rolled back).
    pub async fn create<R: Record>(&self, table: &str, record: &mut R) -> Result<(), EngineError> {
        self.create_in_batches(table, std::slice::from_mut(record), 1)
            .await
    }

    /// Insert `records` with multi-row `INSERT`s of at most `batch_size` rows, all inside one
    /// transaction. Any failing chunk rolls back every chunk before it.
    ///
    /// # Errors
    /// Returns `ValidationError::NullValue` for an empty slice, `InvalidBatchSize` for a zero
    /// batch size, or the store error of the first failing chunk.
    pub async fn create_in_batches<R: Record>(
        &self,
        table: &str,
        records: &mut [R],
        batch_size: usize,
    ) -> Result<(), EngineError> {
        let pk = validate_target::<R>(table)?;
        validate_batch(records, batch_size)?;

        let tx = Tx::begin(self.session().await?, Arc::clone(&self.logger)).await?;
        let outcome = insert_chunks(&tx, table, records, batch_size, pk).await;
        tx.finish(outcome).await
    }

    /// Delete every row matching `filter`; returns the number removed, which may be zero.
    ///
    /// # Errors
    /// Returns `ValidationError::MissingWhereClause` for an empty filter, or the store error.
    pub async fn delete_row(&self, table: &str, filter: &Filter) -> Result<u64, EngineError> {
        validate_identifier(table)?;
        validate_scoped(filter)?;

        let stmt = sql::delete(table, filter);
        let tx = Tx::begin(self.session().await?, Arc::clone(&self.logger)).await?;
        let outcome = tx.dml(&stmt).await;
        tx.finish(outcome).await
    }

    /// Set the changeset's columns on every row matching `filter`; returns the rows updated.
    ///
    /// A record converts into a changeset of its non-zero, non-key fields.
    ///
    /// # Errors
    /// Returns `ValidationError::NullValue` for an empty changeset,
    /// `ValidationError::MissingWhereClause` for an empty filter, or the store error.
    pub async fn update_row(
        &self,
        table: &str,
        patch: impl Into<Changeset>,
        filter: &Filter,
    ) -> Result<u64, EngineError> {
        let patch = patch.into();
        validate_identifier(table)?;
        validate_changeset(&patch)?;
        validate_scoped(filter)?;

        let stmt = sql::update(table, &patch, filter);
        let tx = Tx::begin(self.session().await?, Arc::clone(&self.logger)).await?;
        let outcome = tx.dml(&stmt).await;
        tx.finish(outcome).await
    }
}

/// Key column to omit from a chunk's `INSERT` so the database generates it: only when every
/// record in the chunk still holds a zero key.
fn generated_key<R: Record>(chunk: &[R], pk: Option<usize>) -> Option<usize> {
    pk.filter(|&idx| {
        chunk
            .iter()
            .all(|record| record.values().get(idx).is_none_or(RowValues::is_zero))
    })
}

/// `RETURNING` rows come back in no guaranteed order. Integer keys generated by one
/// statement ascend in `VALUES` order, so sorting them restores the row each belongs to.
fn in_insert_order(mut keys: Vec<RowValues>) -> Vec<RowValues> {
    if keys.iter().all(|key| key.as_int().is_some()) {
        keys.sort_by_key(|key| key.as_int().copied());
    }
    keys
}

async fn insert_chunks<R: Record>(
    tx: &Tx,
    table: &str,
    records: &mut [R],
    batch_size: usize,
    pk: Option<usize>,
) -> Result<(), EngineError> {
    for chunk in records.chunks_mut(batch_size) {
        match generated_key(chunk, pk) {
            Some(idx) => {
                let columns: Vec<&str> = R::columns()
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, col)| *col)
                    .collect();
                let rows = chunk
                    .iter()
                    .map(|record| {
                        let mut values = record.values();
                        values.remove(idx);
                        values
                    })
                    .collect();
                let stmt = sql::insert(table, &columns, rows, Some(R::columns()[idx]));
                let returned = tx.select(&stmt).await?;
                let keys = in_insert_order(
                    returned
                        .results
                        .iter()
                        .filter_map(|row| row.get_by_index(0).cloned())
                        .collect(),
                );
                for (record, key) in chunk.iter_mut().zip(&keys) {
                    record.set_primary_key(key);
                }
            }
            None => {
                let rows = chunk.iter().map(R::values).collect();
                let stmt = sql::insert(table, R::columns(), rows, None);
                tx.dml(&stmt).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::CustomDbRow;

    #[derive(Debug, Default)]
    struct Tag {
        id: i64,
        label: String,
    }

    impl Record for Tag {
        fn columns() -> &'static [&'static str] {
            &["id", "label"]
        }
        fn primary_key() -> Option<&'static str> {
            Some("id")
        }
        fn values(&self) -> Vec<RowValues> {
            vec![self.id.into(), (&self.label).into()]
        }
        fn from_row(row: &CustomDbRow) -> Result<Self, EngineError> {
            Ok(Self {
                id: row.get_int("id")?,
                label: row.get_text("label")?,
            })
        }
    }

    fn tag(id: i64) -> Tag {
        Tag {
            id,
            label: "t".into(),
        }
    }

    #[test]
    fn keys_are_generated_only_for_all_zero_chunks() {
        assert_eq!(generated_key(&[tag(0), tag(0)], Some(0)), Some(0));
        assert_eq!(generated_key(&[tag(0), tag(7)], Some(0)), None);
        assert_eq!(generated_key(&[tag(0)], None), None);
    }

    #[test]
    fn returned_integer_keys_follow_insert_order() {
        let keys = in_insert_order(vec![RowValues::Int(9), RowValues::Int(7), RowValues::Int(8)]);
        assert_eq!(
            keys,
            vec![RowValues::Int(7), RowValues::Int(8), RowValues::Int(9)]
        );

        let text = vec![RowValues::Text("b".into()), RowValues::Text("a".into())];
        assert_eq!(in_insert_order(text.clone()), text);
    }
}
