//! Read-only aggregation of transactions by category and by calendar month.
//!
//! Summaries always run over the full collection: the rows are fetched with
//! a minimal projection and grouped in memory.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error};

use super::core::TransactionType;

/// The state needed to compute transaction summaries.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The aggregate for one `(type, category)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The transaction type of the group.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category of the group.
    pub category: String,
    /// The sum of the amounts in the group.
    pub total: f64,
    /// The number of transactions in the group.
    pub count: u64,
}

/// The aggregate for one `(year, month, type)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The calendar year of the group.
    pub year: i32,
    /// The calendar month of the group, 1-based.
    pub month: u8,
    /// The transaction type of the group.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The sum of the amounts in the group.
    pub total: f64,
    /// The number of transactions in the group.
    pub count: u64,
}

/// A route handler for the summary of transactions grouped by category.
pub async fn category_summary_endpoint(
    State(state): State<SummaryState>,
) -> Result<Json<Vec<CategorySummary>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    summarize_by_category(&connection).map(Json)
}

/// A route handler for the summary of transactions grouped by month.
pub async fn monthly_summary_endpoint(
    State(state): State<SummaryState>,
) -> Result<Json<Vec<MonthlySummary>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    summarize_by_month(&connection).map(Json)
}

/// Group all transactions by `(type, category)`, summing amounts and
/// counting rows. The result is sorted by total descending.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn summarize_by_category(
    connection: &Connection,
) -> Result<Vec<CategorySummary>, Error> {
    let rows = connection
        .prepare("SELECT type, category, amount FROM \"transaction\"")?
        .query_map([], |row| {
            Ok((
                row.get::<_, TransactionType>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: HashMap<(TransactionType, String), (f64, u64)> = HashMap::new();
    for (kind, category, amount) in rows {
        let (total, count) = groups.entry((kind, category)).or_insert((0.0, 0));
        *total += amount;
        *count += 1;
    }

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|((kind, category), (total, count))| CategorySummary {
            kind,
            category,
            total,
            count,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(summaries)
}

/// Group all transactions by `(year, month, type)`, summing amounts and
/// counting rows. The result is sorted by year descending, then month
/// descending, with the type name as a deterministic tiebreaker.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn summarize_by_month(
    connection: &Connection,
) -> Result<Vec<MonthlySummary>, Error> {
    let rows = connection
        .prepare("SELECT date, type, amount FROM \"transaction\"")?
        .query_map([], |row| {
            Ok((
                row.get::<_, OffsetDateTime>(0)?,
                row.get::<_, TransactionType>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: HashMap<(i32, u8, TransactionType), (f64, u64)> = HashMap::new();
    for (date, kind, amount) in rows {
        let key = (date.year(), u8::from(date.month()), kind);
        let (total, count) = groups.entry(key).or_insert((0.0, 0));
        *total += amount;
        *count += 1;
    }

    let mut summaries: Vec<MonthlySummary> = groups
        .into_iter()
        .map(|((year, month, kind), (total, count))| MonthlySummary {
            year,
            month,
            kind,
            total,
            count,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| b.month.cmp(&a.month))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
    });

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::transaction::{
        CategorySummary, MonthlySummary, TransactionType,
        core::{
            create_transaction,
            test_utils::{get_test_connection, new_expense},
        },
    };

    use super::{summarize_by_category, summarize_by_month};

    const NOW: time::OffsetDateTime = datetime!(2025-06-16 09:30 UTC);

    #[test]
    fn groups_by_type_and_category_sorted_by_total() {
        let conn = get_test_connection();
        create_transaction(new_expense(10.0, "Food"), NOW, &conn).unwrap();
        create_transaction(new_expense(20.0, "Food"), NOW, &conn).unwrap();
        let mut income = new_expense(5.0, "Food");
        income.kind = TransactionType::Income;
        create_transaction(income, NOW, &conn).unwrap();

        let summaries = summarize_by_category(&conn).unwrap();

        assert_eq!(
            summaries,
            [
                CategorySummary {
                    kind: TransactionType::Expense,
                    category: "Food".to_owned(),
                    total: 30.0,
                    count: 2,
                },
                CategorySummary {
                    kind: TransactionType::Income,
                    category: "Food".to_owned(),
                    total: 5.0,
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn empty_store_yields_empty_summaries() {
        let conn = get_test_connection();

        assert_eq!(summarize_by_category(&conn).unwrap(), []);
        assert_eq!(summarize_by_month(&conn).unwrap(), []);
    }

    #[test]
    fn groups_by_month_sorted_newest_first() {
        let conn = get_test_connection();
        for (date, amount) in [
            (datetime!(2025-05-10 12:00 UTC), 10.0),
            (datetime!(2025-05-20 12:00 UTC), 15.0),
            (datetime!(2025-06-01 12:00 UTC), 7.0),
            (datetime!(2024-12-31 12:00 UTC), 3.0),
        ] {
            let mut new_transaction = new_expense(amount, "Food");
            new_transaction.date = date;
            create_transaction(new_transaction, NOW, &conn).unwrap();
        }

        let summaries = summarize_by_month(&conn).unwrap();

        assert_eq!(
            summaries,
            [
                MonthlySummary {
                    year: 2025,
                    month: 6,
                    kind: TransactionType::Expense,
                    total: 7.0,
                    count: 1,
                },
                MonthlySummary {
                    year: 2025,
                    month: 5,
                    kind: TransactionType::Expense,
                    total: 25.0,
                    count: 2,
                },
                MonthlySummary {
                    year: 2024,
                    month: 12,
                    kind: TransactionType::Expense,
                    total: 3.0,
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn splits_months_by_transaction_type() {
        let conn = get_test_connection();
        let mut income = new_expense(100.0, "Salary");
        income.kind = TransactionType::Income;
        income.date = datetime!(2025-06-01 12:00 UTC);
        create_transaction(income, NOW, &conn).unwrap();
        let mut expense = new_expense(40.0, "Food");
        expense.date = datetime!(2025-06-02 12:00 UTC);
        create_transaction(expense, NOW, &conn).unwrap();

        let summaries = summarize_by_month(&conn).unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|summary| summary.month == 6));
        // Types are split into separate groups within the month.
        assert_eq!(
            summaries
                .iter()
                .filter(|summary| summary.kind == TransactionType::Income)
                .count(),
            1
        );
    }
}
