//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{AppState, Error, database_id::TransactionId};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The confirmation body returned after a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteConfirmation {
    /// A human-readable confirmation message.
    pub message: &'static str,
}

/// A route handler for permanently deleting a transaction.
///
/// There is no time-box on deletes. Returns 404 for an unknown ID.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<DeleteConfirmation>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_transaction(transaction_id, &connection)? {
        0 => Err(Error::NotFound),
        _ => Ok(Json(DeleteConfirmation {
            message: "Transaction deleted successfully",
        })),
    }
}

type RowsAffected = usize;

fn delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &id)],
        )
        .map_err(|error| error.into())
}
