//! Expenseur is a small HTTP API for tracking personal and office expenses.
//!
//! Clients create, list, edit, and delete financial transactions, and
//! retrieve aggregated summaries by category and by calendar month. This
//! library provides the JSON REST API; the `server` binary wires it to a
//! SQLite database and serves it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod json;
mod logging;
mod pagination;
mod routing;
mod transaction;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request field failed validation.
    ///
    /// The field name and message are sent back to the client so it can
    /// point the user at the offending input.
    #[error("{field}: {message}")]
    Validation {
        /// The name of the field that failed validation, as it appears in
        /// the request body.
        field: &'static str,
        /// A human-readable explanation of what is wrong with the field.
        message: String,
    },

    /// The request body could not be parsed as the expected JSON shape.
    #[error("could not parse the request body: {0}")]
    InvalidBody(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An edit was attempted after the transaction's 12-hour edit window
    /// had closed.
    #[error("editing is restricted after 12 hours")]
    EditWindowExpired,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    field: Some(field),
                },
            ),
            Error::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    field: None,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    message: "Transaction not found".to_owned(),
                    field: None,
                },
            ),
            Error::EditWindowExpired => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    message: "Editing is restricted after 12 hours".to_owned(),
                    field: None,
                },
            ),
            Error::DatabaseLockError | Error::SqlError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: "An unexpected error occurred. Try again later or check the logs on the server.".to_owned(),
                    field: None,
                },
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
