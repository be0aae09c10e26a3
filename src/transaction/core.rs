//! Defines the core data models and database queries for transactions.

use std::str::FromStr;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in, spends it, or moves it between
/// accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. a salary payment.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
    /// Money moved between two named accounts.
    Transfer,
}

impl TransactionType {
    /// The lowercase name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

/// The error returned when parsing a string that is not a valid
/// [TransactionType].
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0:?} is not a valid transaction type")]
pub struct ParseTransactionTypeError(String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(ParseTransactionTypeError(text.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The coarse ownership tag that partitions transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    /// Transactions belonging to the office.
    Office,
    /// Transactions belonging to the user personally.
    Personal,
}

impl Division {
    /// The name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Office => "Office",
            Division::Personal => "Personal",
        }
    }
}

/// The error returned when parsing a string that is not a valid [Division].
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0:?} is not a valid division")]
pub struct ParseDivisionError(String);

impl FromStr for Division {
    type Err = ParseDivisionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "Office" => Ok(Division::Office),
            "Personal" => Ok(Division::Personal),
            _ => Err(ParseDivisionError(text.to_owned())),
        }
    }
}

impl ToSql for Division {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Division {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A single financial event: money earned, spent, or moved between accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is income, an expense, or a transfer.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money involved, always positive.
    pub amount: f64,
    /// The category the transaction belongs to, e.g. "Food".
    pub category: String,
    /// Whether the transaction is an office or a personal one.
    pub division: Division,
    /// The account the money came from (or into, for income).
    pub account: String,
    /// The destination account. Present on transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When the transaction was recorded. Edits are only allowed within 12
    /// hours of this time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Set alongside `created_at` at creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The request body for creating a transaction.
///
/// Use [NewTransaction::normalize] to trim string fields before running the
/// field validators over the candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Whether the transaction is income, an expense, or a transfer.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money involved.
    pub amount: f64,
    /// The category the transaction belongs to.
    pub category: String,
    /// Whether the transaction is an office or a personal one.
    pub division: Division,
    /// The account the money came from.
    pub account: String,
    /// The destination account, required for transfers.
    #[serde(default)]
    pub to_account: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl NewTransaction {
    /// Trim all string fields. An empty destination account becomes `None`.
    pub fn normalize(mut self) -> Self {
        self.category = self.category.trim().to_owned();
        self.account = self.account.trim().to_owned();
        self.description = self.description.trim().to_owned();
        self.to_account = normalize_optional_text(self.to_account);
        self
    }
}

/// The request body for editing a transaction.
///
/// Only the fields present in the payload are overwritten. The record's id
/// and timestamps can never be set through an edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransaction {
    /// The new transaction type, if changing it.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The new amount, if changing it.
    pub amount: Option<f64>,
    /// The new category, if changing it.
    pub category: Option<String>,
    /// The new division, if changing it.
    pub division: Option<Division>,
    /// The new source account, if changing it.
    pub account: Option<String>,
    /// The new destination account, if changing it.
    pub to_account: Option<String>,
    /// The new description, if changing it.
    pub description: Option<String>,
    /// The new date, if changing it.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

impl UpdateTransaction {
    /// Trim the string fields that are present. A destination account that
    /// is empty after trimming is treated as absent.
    pub fn normalize(mut self) -> Self {
        self.category = self.category.map(|category| category.trim().to_owned());
        self.account = self.account.map(|account| account.trim().to_owned());
        self.description = self
            .description
            .map(|description| description.trim().to_owned());
        self.to_account = normalize_optional_text(self.to_account);
        self
    }
}

fn normalize_optional_text(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Convert a timestamp to UTC so that the TEXT encoding in the database
/// sorts chronologically.
pub(crate) fn to_utc(date_time: OffsetDateTime) -> OffsetDateTime {
    date_time.to_offset(UtcOffset::UTC)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// The caller is expected to have normalized and validated
/// `new_transaction`. Both `created_at` and `updated_at` are set to `now`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = to_utc(now);
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (type, amount, category, division, account, to_account, description, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id, type, amount, category, division, account, to_account, description, date, created_at, updated_at",
        )?
        .query_row(
            rusqlite::params![
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.category,
                new_transaction.division,
                new_transaction.account,
                new_transaction.to_account,
                new_transaction.description,
                to_utc(new_transaction.date),
                now,
                now,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, type, amount, category, division, account, to_account, description, date, created_at, updated_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                division TEXT NOT NULL,
                account TEXT NOT NULL,
                to_account TEXT,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    // Indexes matching the list and summary access patterns.
    connection.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);
         CREATE INDEX IF NOT EXISTS idx_transaction_type_date ON \"transaction\"(type, date);
         CREATE INDEX IF NOT EXISTS idx_transaction_division_date ON \"transaction\"(division, date);
         CREATE INDEX IF NOT EXISTS idx_transaction_category_date ON \"transaction\"(category, date);
         CREATE INDEX IF NOT EXISTS idx_transaction_created_at ON \"transaction\"(created_at);",
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
///
/// **Note:** This function expects the row to contain all the table columns
/// in the order they were defined.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        division: row.get(4)?,
        account: row.get(5)?,
        to_account: row.get(6)?,
        description: row.get(7)?,
        date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
