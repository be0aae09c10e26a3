//! Database query helpers for listing transactions.

use rusqlite::{Connection, ToSql};
use time::OffsetDateTime;

use crate::{Error, pagination::Page};

use super::core::{Division, Transaction, map_transaction_row, to_utc};

/// The filters a list request can apply. All filters are ANDed together.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter {
    /// Only return transactions with this division.
    pub(crate) division: Option<Division>,
    /// Only return transactions with this category.
    pub(crate) category: Option<String>,
    /// Only return transactions whose date falls in this range, inclusive
    /// on both endpoints.
    pub(crate) date_range: Option<(OffsetDateTime, OffsetDateTime)>,
}

/// Get a page of transactions matching `filter`, sorted by date descending.
///
/// The transaction ID is used as a tiebreaker so the order stays stable
/// across requests.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn list_transactions(
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut params) = build_where_clause(filter);
    let query = format!(
        "SELECT id, type, amount, category, division, account, to_account, description, date, created_at, updated_at
         FROM \"transaction\" {where_clause} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
    );

    params.push(Box::new(page.size as i64));
    params.push(Box::new(page.offset() as i64));
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|param| param.as_ref()).collect();

    connection
        .prepare(&query)?
        .query_map(&param_refs[..], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions matching `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_transactions_matching(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = build_where_clause(filter);
    let query = format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}");
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|param| param.as_ref()).collect();

    connection
        .prepare(&query)?
        .query_row(&param_refs[..], |row| row.get::<_, i64>(0).map(|count| count as u64))
        .map_err(|error| error.into())
}

fn build_where_clause(filter: &TransactionFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(division) = filter.division {
        clauses.push("division = ?");
        params.push(Box::new(division));
    }

    if let Some(category) = &filter.category {
        clauses.push("category = ?");
        params.push(Box::new(category.clone()));
    }

    if let Some((start, end)) = filter.date_range {
        clauses.push("date BETWEEN ? AND ?");
        params.push(Box::new(to_utc(start)));
        params.push(Box::new(to_utc(end)));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    (where_clause, params)
}
