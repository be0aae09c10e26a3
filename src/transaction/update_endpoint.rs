//! Defines the endpoint for editing a transaction.
//!
//! Edits are time-boxed: a transaction may only be changed within 12 hours
//! of its creation, after which it is locked and edits are rejected.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, params};
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, database_id::TransactionId, json::AppJson};

use super::{
    core::{Transaction, UpdateTransaction, get_transaction, to_utc},
    validation::validate_transaction_update,
};

/// How long a transaction stays editable after creation.
pub(crate) const EDIT_WINDOW: Duration = Duration::hours(12);

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for editing a transaction within its edit window.
///
/// Returns 404 for an unknown ID, 403 once the 12-hour window has closed,
/// and 400 when a supplied field fails validation. On success the updated
/// record is returned; `updatedAt` keeps its original value.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    AppJson(updates): AppJson<UpdateTransaction>,
) -> Result<Json<Transaction>, Error> {
    let now = OffsetDateTime::now_utc();
    let updates = updates.normalize();

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let mut transaction = get_transaction(transaction_id, &connection)?;

    if is_edit_window_expired(transaction.created_at, now) {
        return Err(Error::EditWindowExpired);
    }

    if let Some(error) = validate_transaction_update(&updates, now).into_iter().next() {
        return Err(error.into());
    }

    apply_updates(&mut transaction, updates);
    update_transaction(&transaction, &connection)?;

    Ok(Json(transaction))
}

/// Whether `created_at` is more than [EDIT_WINDOW] before `now`.
pub(crate) fn is_edit_window_expired(created_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    now - created_at > EDIT_WINDOW
}

/// Overwrite the editable fields of `transaction` with the fields present
/// in `updates`.
///
/// Only the allowed fields can be written; the record's id, `created_at`,
/// and `updated_at` are never touched.
fn apply_updates(transaction: &mut Transaction, updates: UpdateTransaction) {
    if let Some(kind) = updates.kind {
        transaction.kind = kind;
    }
    if let Some(amount) = updates.amount {
        transaction.amount = amount;
    }
    if let Some(category) = updates.category {
        transaction.category = category;
    }
    if let Some(division) = updates.division {
        transaction.division = division;
    }
    if let Some(account) = updates.account {
        transaction.account = account;
    }
    if updates.to_account.is_some() {
        transaction.to_account = updates.to_account;
    }
    if let Some(description) = updates.description {
        transaction.description = description;
    }
    if let Some(date) = updates.date {
        transaction.date = to_utc(date);
    }
}

type RowsAffected = usize;

fn update_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
        SET \
            type = ?1, \
            amount = ?2, \
            category = ?3, \
            division = ?4, \
            account = ?5, \
            to_account = ?6, \
            description = ?7, \
            date = ?8 \
        WHERE id = ?9;",
            params![
                transaction.kind,
                transaction.amount,
                transaction.category,
                transaction.division,
                transaction.account,
                transaction.to_account,
                transaction.description,
                transaction.date,
                transaction.id,
            ],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::{Connection, params};
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        database_id::TransactionId,
        json::AppJson,
        transaction::{
            Transaction, TransactionType, UpdateTransaction,
            core::{
                create_transaction, get_transaction,
                test_utils::{get_test_connection, new_expense},
            },
        },
    };

    use super::{
        UpdateTransactionState, is_edit_window_expired, update_transaction_endpoint,
    };

    #[test]
    fn window_is_open_just_before_twelve_hours() {
        let created_at = datetime!(2025-06-16 00:00 UTC);

        let now = created_at + Duration::hours(11) + Duration::minutes(59);

        assert!(!is_edit_window_expired(created_at, now));
    }

    #[test]
    fn window_is_closed_just_after_twelve_hours() {
        let created_at = datetime!(2025-06-16 00:00 UTC);

        let now = created_at + Duration::hours(12) + Duration::minutes(1);

        assert!(is_edit_window_expired(created_at, now));
    }

    fn get_test_state() -> UpdateTransactionState {
        UpdateTransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        }
    }

    /// Insert a transaction whose `created_at` lies `age` in the past.
    fn create_aged_transaction(
        age: Duration,
        state: &UpdateTransactionState,
    ) -> Transaction {
        let connection = state.db_connection.lock().unwrap();
        let created_at = OffsetDateTime::now_utc() - age;
        let mut new_transaction = new_expense(10.0, "Food");
        new_transaction.date = created_at;
        let transaction = create_transaction(new_transaction, created_at, &connection).unwrap();

        get_transaction(transaction.id, &connection).unwrap()
    }

    fn set_stored_to_account(
        id: TransactionId,
        to_account: &str,
        connection: &Connection,
    ) {
        connection
            .execute(
                "UPDATE \"transaction\" SET type = 'transfer', to_account = ?1 WHERE id = ?2",
                params![to_account, id],
            )
            .unwrap();
    }

    #[tokio::test]
    async fn edits_within_the_window() {
        let state = get_test_state();
        let transaction = create_aged_transaction(
            Duration::hours(11) + Duration::minutes(59),
            &state,
        );

        let updated = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                amount: Some(99.0),
                description: Some("  corrected  ".to_owned()),
                ..UpdateTransaction::default()
            }),
        )
        .await
        .expect("expected the edit to succeed");

        assert_eq!(updated.amount, 99.0);
        assert_eq!(updated.description, "corrected");
        // Fields absent from the payload keep their stored values.
        assert_eq!(updated.category, "Food");
    }

    #[tokio::test]
    async fn rejects_edits_after_the_window() {
        let state = get_test_state();
        let transaction = create_aged_transaction(
            Duration::hours(12) + Duration::minutes(1),
            &state,
        );

        let result = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                amount: Some(99.0),
                ..UpdateTransaction::default()
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::EditWindowExpired)));
        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(unchanged, transaction);
    }

    #[tokio::test]
    async fn rejects_edits_to_unknown_transactions() {
        let state = get_test_state();

        let result = update_transaction_endpoint(
            State(state),
            Path(1337),
            AppJson(UpdateTransaction::default()),
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn does_not_bump_updated_at() {
        let state = get_test_state();
        let transaction = create_aged_transaction(Duration::hours(1), &state);

        let updated = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                amount: Some(42.0),
                ..UpdateTransaction::default()
            }),
        )
        .await
        .expect("expected the edit to succeed");

        assert_eq!(updated.updated_at, transaction.updated_at);
        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(stored.updated_at, transaction.updated_at);
    }

    #[tokio::test]
    async fn rejects_a_transfer_payload_with_matching_accounts() {
        let state = get_test_state();
        let transaction = create_aged_transaction(Duration::hours(1), &state);

        let result = update_transaction_endpoint(
            State(state),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                kind: Some(TransactionType::Transfer),
                account: Some("Checking".to_owned()),
                to_account: Some("Checking".to_owned()),
                ..UpdateTransaction::default()
            }),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "toAccount",
                ..
            })
        ));
    }

    /// The transfer invariant is checked against the payload alone: editing
    /// `account` without re-sending `type` is not re-checked against the
    /// stored destination, so the stored pair may end up equal. See
    /// DESIGN.md for the rationale.
    #[tokio::test]
    async fn editing_account_alone_skips_the_transfer_check() {
        let state = get_test_state();
        let transaction = create_aged_transaction(Duration::hours(1), &state);
        {
            let connection = state.db_connection.lock().unwrap();
            set_stored_to_account(transaction.id, "Savings", &connection);
        }

        let updated = update_transaction_endpoint(
            State(state),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                account: Some("Savings".to_owned()),
                ..UpdateTransaction::default()
            }),
        )
        .await
        .expect("expected the edit to be allowed");

        assert_eq!(updated.account, "Savings");
        assert_eq!(updated.to_account.as_deref(), Some("Savings"));
    }

    #[tokio::test]
    async fn cannot_overwrite_protected_fields() {
        let state = get_test_state();
        let transaction = create_aged_transaction(Duration::hours(1), &state);

        // `id` and timestamps are not part of the update payload shape, so a
        // client cannot address them; the whitelist merge leaves them alone.
        let updated = update_transaction_endpoint(
            State(state.clone()),
            Path(transaction.id),
            AppJson(UpdateTransaction {
                category: Some("Travel".to_owned()),
                ..UpdateTransaction::default()
            }),
        )
        .await
        .expect("expected the edit to succeed");

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.created_at, transaction.created_at);
        assert_eq!(updated.category, "Travel");
    }
}
