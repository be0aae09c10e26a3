//! Field-level validation for transaction create and edit requests.
//!
//! Validators are pure functions over the full candidate record: they take
//! the (already normalized) input and the current time, and return every
//! field error they find. Handlers report the first error to the client.

use time::OffsetDateTime;

use crate::Error;

use super::core::{NewTransaction, TransactionType, UpdateTransaction};

/// The maximum number of characters allowed in a description.
pub(crate) const MAX_DESCRIPTION_LENGTH: usize = 500;

/// A validation failure for a single request field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldError {
    /// The field name as it appears in the request body.
    pub(crate) field: &'static str,
    /// A human-readable explanation of what is wrong.
    pub(crate) message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

impl From<FieldError> for Error {
    fn from(error: FieldError) -> Self {
        Error::Validation {
            field: error.field,
            message: error.message,
        }
    }
}

/// Validate a candidate transaction for creation.
///
/// `candidate` is expected to be normalized (strings trimmed, empty
/// destination account collapsed to `None`). Returns every field error
/// found, in field order.
pub(crate) fn validate_new_transaction(
    candidate: &NewTransaction,
    now: OffsetDateTime,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(error) = validate_amount(candidate.amount) {
        errors.push(error);
    }

    if candidate.category.is_empty() {
        errors.push(FieldError::new("category", "Category is required"));
    }

    if candidate.account.is_empty() {
        errors.push(FieldError::new("account", "Account is required"));
    }

    if candidate.kind == TransactionType::Transfer {
        errors.extend(validate_transfer_accounts(
            Some(&candidate.account),
            candidate.to_account.as_deref(),
        ));
    }

    errors.extend(validate_description(&candidate.description));

    if let Some(error) = validate_date(candidate.date, now) {
        errors.push(error);
    }

    errors
}

/// Validate an edit payload.
///
/// Only the fields present in the payload are checked, mirroring the create
/// rules. The transfer invariant is evaluated against the payload alone:
/// when the payload sets the type to transfer, its own `toAccount` must be
/// present and distinct from its own `account`; stored values are not
/// consulted.
pub(crate) fn validate_transaction_update(
    updates: &UpdateTransaction,
    now: OffsetDateTime,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(error) = updates.amount.and_then(validate_amount) {
        errors.push(error);
    }

    if updates.category.as_deref() == Some("") {
        errors.push(FieldError::new("category", "Category is required"));
    }

    if updates.account.as_deref() == Some("") {
        errors.push(FieldError::new("account", "Account is required"));
    }

    if updates.kind == Some(TransactionType::Transfer) {
        errors.extend(validate_transfer_accounts(
            updates.account.as_deref(),
            updates.to_account.as_deref(),
        ));
    }

    if let Some(description) = updates.description.as_deref() {
        errors.extend(validate_description(description));
    }

    if let Some(error) = updates.date.and_then(|date| validate_date(date, now)) {
        errors.push(error);
    }

    errors
}

fn validate_amount(amount: f64) -> Option<FieldError> {
    // Written so that NaN is rejected too.
    if amount > 0.0 {
        None
    } else {
        Some(FieldError::new("amount", "Amount must be greater than 0"))
    }
}

fn validate_description(description: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if description.is_empty() {
        errors.push(FieldError::new("description", "Description is required"));
    }

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        errors.push(FieldError::new(
            "description",
            "Description cannot exceed 500 characters",
        ));
    }

    errors
}

fn validate_date(date: OffsetDateTime, now: OffsetDateTime) -> Option<FieldError> {
    if date > now {
        Some(FieldError::new("date", "Date cannot be in the future"))
    } else {
        None
    }
}

fn validate_transfer_accounts(
    account: Option<&str>,
    to_account: Option<&str>,
) -> Option<FieldError> {
    match to_account {
        None => Some(FieldError::new(
            "toAccount",
            "Destination account is required for transfers",
        )),
        Some(to_account) if account == Some(to_account) => Some(FieldError::new(
            "toAccount",
            "Source and destination accounts must be different",
        )),
        Some(_) => None,
    }
}
