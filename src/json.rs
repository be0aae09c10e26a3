//! JSON body extraction with the application's error shape.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::Error;

/// A JSON body extractor whose rejection is the application [Error].
///
/// A request body that is not valid JSON, or that does not match the
/// expected shape, is reported as a 400 with the same JSON error body as
/// every other client error, rather than axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidBody(rejection.body_text())
    }
}
