//! SQL text for the CRUD operations.
//!
//! Every builder emits `?` placeholders in argument order; backends that need numbered
//! placeholders rewrite them just before execution. Identifiers must already be validated.

use std::fmt::Write;

use crate::filter::Filter;
use crate::record::Changeset;
use crate::types::RowValues;

/// SQL text together with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<RowValues>,
}

/// Row window applied to a `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

fn push_where(sql: &mut String, params: &mut Vec<RowValues>, filter: &Filter) {
    if let Some(expr) = filter.expr() {
        let _ = write!(sql, " WHERE ({expr})");
        params.extend_from_slice(filter.args());
    }
}

#[must_use]
pub fn select(
    table: &str,
    columns: &[&str],
    filter: &Filter,
    order: Option<&str>,
    window: Option<Window>,
) -> Statement {
    let mut sql = format!("SELECT {} FROM {table}", columns.join(", "));
    let mut params = Vec::with_capacity(filter.args().len());
    push_where(&mut sql, &mut params, filter);
    if let Some(order) = order.map(str::trim).filter(|o| !o.is_empty()) {
        let _ = write!(sql, " ORDER BY {order}");
    }
    if let Some(Window { limit, offset }) = window {
        let _ = write!(sql, " LIMIT {limit} OFFSET {offset}");
    }
    Statement { sql, params }
}

#[must_use]
pub fn count(table: &str, filter: &Filter) -> Statement {
    let mut sql = format!("SELECT COUNT(*) AS total FROM {table}");
    let mut params = Vec::with_capacity(filter.args().len());
    push_where(&mut sql, &mut params, filter);
    Statement { sql, params }
}

/// Multi-row `INSERT`; `rows` must all match `columns` in length.
#[must_use]
pub fn insert(
    table: &str,
    columns: &[&str],
    rows: Vec<Vec<RowValues>>,
    returning: Option<&str>,
) -> Statement {
    let group = format!("({})", vec!["?"; columns.len()].join(", "));
    let groups = vec![group.as_str(); rows.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES {groups}",
        columns.join(", ")
    );
    if let Some(key) = returning {
        let _ = write!(sql, " RETURNING {key}");
    }
    let params = rows.into_iter().flatten().collect();
    Statement { sql, params }
}

#[must_use]
pub fn update(table: &str, patch: &Changeset, filter: &Filter) -> Statement {
    let assignments: Vec<String> = patch.columns().map(|col| format!("{col} = ?")).collect();
    let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
    let mut params: Vec<RowValues> = patch.iter().map(|(_, v)| v.clone()).collect();
    push_where(&mut sql, &mut params, filter);
    Statement { sql, params }
}

#[must_use]
pub fn delete(table: &str, filter: &Filter) -> Statement {
    let mut sql = format!("DELETE FROM {table}");
    let mut params = Vec::with_capacity(filter.args().len());
    push_where(&mut sql, &mut params, filter);
    Statement { sql, params }
}
