//! Defines the endpoint for listing transactions with filters and paging.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    pagination::{Page, PaginationConfig},
};

use super::{
    core::Division,
    query::{TransactionFilter, count_transactions_matching, list_transactions},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The config that controls how results are paged.
    pub pagination_config: PaginationConfig,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the list endpoint.
///
/// The date range is only applied when both `startDate` and `endDate` are
/// present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Only return transactions with this division.
    pub division: Option<Division>,
    /// Only return transactions with this category.
    pub category: Option<String>,
    /// The inclusive start of the date range.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    /// The inclusive end of the date range.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    /// The 1-based page number to return.
    pub page: Option<u64>,
    /// The number of transactions per page.
    pub limit: Option<u64>,
}

/// A route handler for listing transactions.
///
/// Filters are ANDed together and results are sorted by date descending.
/// The body is a JSON array holding one page of results; the total number
/// of matching records is reported in the `X-Total-Count` header.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Response, Error> {
    let page = Page::resolve(query.page, query.limit, &state.pagination_config);
    let filter = TransactionFilter {
        division: query.division,
        category: query.category,
        date_range: match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        },
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = list_transactions(&filter, page, &connection)?;
    let total = count_transactions_matching(&filter, &connection)?;

    Ok(([("x-total-count", total.to_string())], Json(transactions)).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use time::{Duration, macros::datetime};

    use crate::{
        pagination::PaginationConfig,
        transaction::core::{
            create_transaction,
            test_utils::{get_test_connection, new_expense},
        },
    };

    use super::{ListTransactionsQuery, ListTransactionsState, list_transactions_endpoint};

    fn get_test_state() -> ListTransactionsState {
        ListTransactionsState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    fn empty_query() -> ListTransactionsQuery {
        ListTransactionsQuery {
            division: None,
            category: None,
            start_date: None,
            end_date: None,
            page: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn reports_the_total_count_in_a_header() {
        let state = get_test_state();
        let now = datetime!(2025-06-16 09:30 UTC);
        {
            let connection = state.db_connection.lock().unwrap();
            for i in 0..3 {
                let mut new_transaction = new_expense((i + 1) as f64, "Food");
                new_transaction.date = now - Duration::days(i);
                create_transaction(new_transaction, now, &connection).unwrap();
            }
        }

        let response = list_transactions_endpoint(
            State(state),
            Query(ListTransactionsQuery {
                limit: Some(2),
                ..empty_query()
            }),
        )
        .await
        .expect("expected the list to succeed");

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("x-total-count")
                .expect("expected the x-total-count header to be set"),
            "3"
        );
    }

    #[tokio::test]
    async fn empty_store_yields_an_empty_array() {
        let state = get_test_state();

        let response = list_transactions_endpoint(State(state), Query(empty_query()))
            .await
            .expect("expected the list to succeed");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"[]");
    }
}
