//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{AppState, Error, json::AppJson};

use super::{
    core::{NewTransaction, Transaction, create_transaction},
    validation::validate_new_transaction,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// Returns 201 with the stored record, including its generated ID and
/// timestamps. A validation failure returns 400 naming the offending field
/// and nothing is persisted.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    AppJson(new_transaction): AppJson<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let now = OffsetDateTime::now_utc();
    let new_transaction = new_transaction.normalize();

    if let Some(error) = validate_new_transaction(&new_transaction, now).into_iter().next() {
        return Err(error.into());
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transaction = create_transaction(new_transaction, now, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
