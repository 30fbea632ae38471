//! The route for creating a new user account.

use std::str::FromStr;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    models::{NewUser, PasswordHash, UserID},
    stores::{TransactionStore, UserStore},
};

/// The upper bound on username length, matching the user table's column.
const USERNAME_MAX_CHARS: usize = 150;

/// The data submitted when registering a new account.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// The username to register. Must be unique.
    pub username: String,
    /// The email address of the new user.
    pub email: String,
    /// The plaintext password for the new account.
    pub password: String,
}

/// The public view of a newly created account.
///
/// The password hash and admin flag are never echoed back.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The ID of the new user.
    pub id: UserID,
    /// The registered username.
    pub username: String,
    /// The registered email address.
    pub email: String,
}

/// Handler for creating a new user account.
///
/// Accounts created through this route are never admins; the admin flag can
/// only be set through the `create_admin` binary.
///
/// # Errors
///
/// This function will return an error in a JSON response if:
/// - the username is empty or too long (400),
/// - the email address is invalid (400),
/// - the password is too weak (400),
/// - or the username is already taken (409).
pub async fn register<T, U>(
    State(state): State<AppState<T, U>>,
    Json(data): Json<RegisterData>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    if data.username.is_empty() {
        return Err(Error::InvalidField {
            field: "username",
            message: "username must not be empty".to_string(),
        });
    }

    if data.username.chars().count() > USERNAME_MAX_CHARS {
        return Err(Error::InvalidField {
            field: "username",
            message: format!("username must be at most {USERNAME_MAX_CHARS} characters"),
        });
    }

    let email = EmailAddress::from_str(&data.email).map_err(|error| Error::InvalidField {
        field: "email",
        message: error.to_string(),
    })?;

    let password_hash = PasswordHash::from_raw_password(&data.password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(NewUser {
        username: data.username,
        email,
        password_hash,
        is_admin: false,
    })?;

    tracing::info!("registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email.to_string(),
        }),
    ))
}
