//! The routes for exchanging credentials for tokens and refreshing access
//! tokens.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{TokenKind, issue_token, issue_token_pair, verify_token},
    stores::{TransactionStore, UserStore},
};

/// The credentials submitted when logging in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The username of the account.
    pub username: String,
    /// The plaintext password of the account.
    pub password: String,
}

/// The body submitted when refreshing an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshData {
    /// A refresh token issued at log in.
    pub refresh: String,
}

/// The response to a successful refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    /// A newly issued access token.
    pub access: String,
}

/// Handler for logging a user in with their username and password.
///
/// Responds with an access and refresh token pair.
///
/// # Errors
///
/// Returns a 401 response if the username is unknown or the password does not
/// match. Both cases produce the same error so the response does not reveal
/// which usernames exist.
pub async fn log_in<T, U>(
    State(state): State<AppState<T, U>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let user = state
        .user_store
        .get_by_username(&credentials.username)
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

    let password_matches = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_matches {
        return Err(Error::InvalidCredentials);
    }

    let tokens = issue_token_pair(user.id, &state.jwt_keys, OffsetDateTime::now_utc())?;

    tracing::info!("user {} logged in", user.id);

    Ok(Json(tokens))
}

/// Handler for exchanging a refresh token for a new access token.
///
/// # Errors
///
/// Returns a 401 response if the token is invalid, expired, or is not a
/// refresh token.
pub async fn refresh_token<T, U>(
    State(state): State<AppState<T, U>>,
    Json(data): Json<RefreshData>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let user_id = verify_token(&data.refresh, TokenKind::Refresh, &state.jwt_keys)?;

    let access = issue_token(
        user_id,
        TokenKind::Access,
        &state.jwt_keys,
        OffsetDateTime::now_utc(),
    )?;

    Ok(Json(AccessToken { access }))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, build_router,
        auth::TokenPair,
        db::initialize,
        routes::endpoints,
        stores::{SQLiteTransactionStore, SQLiteUserStore},
    };

    use super::AccessToken;

    const PASSWORD: &str = "averysafeandsecurepassword";

    async fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");
        let connection = Arc::new(Mutex::new(connection));

        let state = AppState::new(
            "averysecretsigningkey",
            SQLiteTransactionStore::new(connection.clone()),
            SQLiteUserStore::new(connection),
        );
        let server = TestServer::new(build_router(state));

        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": PASSWORD,
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server
    }

    #[tokio::test]
    async fn log_in_returns_token_pair() {
        let server = get_test_server().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": PASSWORD }))
            .await;

        response.assert_status_ok();
        let tokens = response.json::<TokenPair>();
        assert!(!tokens.access.is_empty());
        assert!(!tokens.refresh.is_empty());
        assert_ne!(tokens.access, tokens.refresh);
    }

    #[tokio::test]
    async fn log_in_fails_on_wrong_password() {
        let server = get_test_server().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": "definitelynotthepassword" }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_fails_on_unknown_username() {
        let server = get_test_server().await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "mallory", "password": PASSWORD }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let server = get_test_server().await;
        let tokens = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": PASSWORD }))
            .await
            .json::<TokenPair>();

        let response = server
            .post(endpoints::REFRESH_TOKEN)
            .json(&json!({ "refresh": tokens.refresh }))
            .await;

        response.assert_status_ok();
        let body = response.json::<AccessToken>();
        assert!(!body.access.is_empty());
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let server = get_test_server().await;
        let tokens = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "alice", "password": PASSWORD }))
            .await
            .json::<TokenPair>();

        let response = server
            .post(endpoints::REFRESH_TOKEN)
            .json(&json!({ "refresh": tokens.access }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_token() {
        let server = get_test_server().await;

        let response = server
            .post(endpoints::REFRESH_TOKEN)
            .json(&json!({ "refresh": "notatoken" }))
            .await;

        response.assert_status_unauthorized();
    }
}
