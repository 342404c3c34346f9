use crate::error::EngineError;
use crate::filter::Filter;
use crate::page::Pagination;
use crate::record::Record;
use crate::sql::{self, Window};
use crate::validation::validate_target;

use super::{Engine, decode_rows, row_count, traced_select};

impl Engine {
    /// Read the first row matching `filter` into `out`.
    ///
    /// Rows are ordered by the record's primary key when it declares one. Returns `false`, and
    /// leaves `out` untouched, when nothing matches.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` for a malformed table or record, the store error, or
    /// `EngineError::Decode` from `R::from_row`.
    pub async fn query_row<R: Record>(
        &self,
        table: &str,
        out: &mut R,
        filter: &Filter,
    ) -> Result<bool, EngineError> {
        let pk = validate_target::<R>(table)?;
        let order = pk.map(|idx| format!("{} ASC", R::columns()[idx]));
        let stmt = sql::select(
            table,
            R::columns(),
            filter,
            order.as_deref(),
            Some(Window {
                limit: 1,
                offset: 0,
            }),
        );

        let session = self.session().await?;
        let rows = traced_select(&*self.logger, &session, &stmt).await?;
        match rows.results.first() {
            Some(row) => {
                *out = R::from_row(row)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read one page of matching rows into `out` and return the total number of matches.
    ///
    /// `order` is spliced in as an `ORDER BY` clause when non-blank. The total ignores
    /// pagination, so it is the same for every page.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` for a malformed table or record, the store error, or
    /// `EngineError::Decode` if a row cannot be decoded.
    pub async fn query_list<R: Record>(
        &self,
        table: &str,
        order: &str,
        pagination: Pagination,
        out: &mut Vec<R>,
        filter: &Filter,
    ) -> Result<u64, EngineError> {
        validate_target::<R>(table)?;
        let count_stmt = sql::count(table, filter);
        let page_stmt = sql::select(
            table,
            R::columns(),
            filter,
            Some(order),
            Some(Window {
                limit: pagination.limit(),
                offset: pagination.offset(),
            }),
        );

        let session = self.session().await?;
        let counted = traced_select(&*self.logger, &session, &count_stmt).await?;
        let total = counted
            .results
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(|value| value.as_int())
            .and_then(|n| u64::try_from(*n).ok())
            .ok_or_else(|| EngineError::Decode("COUNT(*) returned no integer".to_string()))?;

        let rows = traced_select(&*self.logger, &session, &page_stmt).await?;
        *out = decode_rows(&rows)?;
        Ok(total)
    }

    /// Read every matching row into `out`; returns how many were read.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` for a malformed table or record, the store error, or
    /// `EngineError::Decode` if a row cannot be decoded.
    pub async fn query_all<R: Record>(
        &self,
        table: &str,
        order: &str,
        out: &mut Vec<R>,
        filter: &Filter,
    ) -> Result<u64, EngineError> {
        validate_target::<R>(table)?;
        let stmt = sql::select(table, R::columns(), filter, Some(order), None);

        let session = self.session().await?;
        let rows = traced_select(&*self.logger, &session, &stmt).await?;
        *out = decode_rows(&rows)?;
        Ok(row_count(out.len()))
    }
}
