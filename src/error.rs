//! Defines the app level error type and its conversion to JSON HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A field on a create or update request failed validation.
    ///
    /// `field` names the offending field so that clients can highlight it.
    #[error("invalid value for field \"{field}\": {message}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: &'static str,
        /// Why the field was rejected.
        message: String,
    },

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The user provided an invalid username and password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, expired, of the wrong kind,
    /// or refers to a user that no longer exists.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The username chosen during registration is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The authenticated user is neither the owner of the requested record
    /// nor an admin.
    ///
    /// Rendered as a 404 so that clients cannot probe for the existence of
    /// other users' records.
    #[error("the actor may not access the requested resource")]
    NotAuthorized,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A stored tax type column held text that is not a known tax type.
    ///
    /// Requests cannot produce this error because the tax type is a closed
    /// enum at the API boundary; it indicates a corrupt database row.
    #[error("\"{0}\" is not a valid tax type")]
    InvalidTaxType(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server,
    /// never sent to the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            // Row mapping boxes crate errors (e.g. a corrupt tax type column)
            // into conversion failures; unwrap them so the kind stays
            // distinguishable to callers.
            rusqlite::Error::FromSqlConversionFailure(index, column_type, source) => {
                match source.downcast::<Error>() {
                    Ok(error) => {
                        tracing::error!("a stored value could not be parsed: {}", error);
                        *error
                    }
                    Err(source) => {
                        let error =
                            rusqlite::Error::FromSqlConversionFailure(index, column_type, source);
                        tracing::error!("an unhandled SQL error occurred: {}", error);
                        Error::SqlError(error)
                    }
                }
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::InvalidField { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            Error::TooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("password is too weak: {feedback}"), "field": "password" }),
            ),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid credentials" }),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid or expired token" }),
            ),
            Error::DuplicateUsername => (
                StatusCode::CONFLICT,
                json!({ "error": "the username is already taken" }),
            ),
            // A 404 rather than a 403 so that clients cannot tell whether a
            // record they do not own exists.
            Error::NotAuthorized | Error::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "the requested resource could not be found" }),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
