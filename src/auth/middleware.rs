//! Middleware that authenticates API requests from a bearer token.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState, Error,
    auth::{Actor, TokenKind, verify_token},
    stores::{TransactionStore, UserStore},
};

/// Middleware function that checks for a valid access token in the
/// `Authorization` header.
///
/// The authenticated [Actor] is placed into the request and the request is
/// then executed normally if the token is valid, otherwise a 401 response is
/// returned. The user is looked up in the store on every request, so tokens
/// stop working as soon as the user is deleted.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(actor): Extension<Actor>` to receive the actor.
pub async fn auth_guard<T, U>(
    State(state): State<AppState<T, U>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error>
where
    T: TransactionStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    let token = bearer_token(request.headers()).ok_or(Error::InvalidToken)?;
    let user_id = verify_token(token, TokenKind::Access, &state.jwt_keys)?;

    let user = state
        .user_store
        .get_by_id(user_id)
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidToken,
            error => error,
        })?;

    request.extensions_mut().insert(Actor {
        id: user.id,
        is_admin: user.is_admin,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod auth_guard_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Extension, Json, Router, middleware, routing::get};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        AppState,
        auth::{Actor, TokenKind, issue_token},
        db::initialize,
        models::{NewUser, PasswordHash, User, UserID},
        stores::{SQLiteTransactionStore, SQLiteUserStore, UserStore},
    };

    use super::auth_guard;

    type TestState = AppState<SQLiteTransactionStore, SQLiteUserStore>;

    fn get_test_state() -> (TestState, Arc<Mutex<Connection>>) {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");
        let connection = Arc::new(Mutex::new(connection));

        let state = AppState::new(
            "averysecretsigningkey",
            SQLiteTransactionStore::new(connection.clone()),
            SQLiteUserStore::new(connection.clone()),
        );

        (state, connection)
    }

    fn create_test_user(state: &TestState) -> User {
        state
            .user_store
            .create(NewUser {
                username: "alice".to_string(),
                email: EmailAddress::from_str("alice@example.com").unwrap(),
                password_hash: PasswordHash::new_unchecked("notarealhash"),
                is_admin: false,
            })
            .expect("Could not create test user.")
    }

    async fn whoami(Extension(actor): Extension<Actor>) -> Json<i64> {
        Json(actor.id.as_i64())
    }

    fn protected_app(state: TestState) -> Router {
        Router::new()
            .route("/protected", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard::<SQLiteTransactionStore, SQLiteUserStore>,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn request_with_valid_token_succeeds() {
        let (state, _) = get_test_state();
        let user = create_test_user(&state);
        let token = issue_token(
            user.id,
            TokenKind::Access,
            &state.jwt_keys,
            OffsetDateTime::now_utc(),
        )
        .unwrap();
        let server = TestServer::new(protected_app(state));

        let response = server.get("/protected").authorization_bearer(token).await;

        response.assert_status_ok();
        assert_eq!(response.json::<i64>(), user.id.as_i64());
    }

    #[tokio::test]
    async fn request_without_token_is_unauthorized() {
        let (state, _) = get_test_state();
        let server = TestServer::new(protected_app(state));

        let response = server.get("/protected").await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn refresh_token_cannot_authenticate_requests() {
        let (state, _) = get_test_state();
        let user = create_test_user(&state);
        let token = issue_token(
            user.id,
            TokenKind::Refresh,
            &state.jwt_keys,
            OffsetDateTime::now_utc(),
        )
        .unwrap();
        let server = TestServer::new(protected_app(state));

        let response = server.get("/protected").authorization_bearer(token).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected() {
        let (state, connection) = get_test_state();
        let user = create_test_user(&state);
        let token = issue_token(
            user.id,
            TokenKind::Access,
            &state.jwt_keys,
            OffsetDateTime::now_utc(),
        )
        .unwrap();

        connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user WHERE id = ?1", [user.id.as_i64()])
            .expect("Could not delete test user.");

        let server = TestServer::new(protected_app(state));

        let response = server.get("/protected").authorization_bearer(token).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn nonexistent_user_id_is_rejected() {
        let (state, _) = get_test_state();
        let token = issue_token(
            UserID::new(999),
            TokenKind::Access,
            &state.jwt_keys,
            OffsetDateTime::now_utc(),
        )
        .unwrap();
        let server = TestServer::new(protected_app(state));

        let response = server.get("/protected").authorization_bearer(token).await;

        response.assert_status_unauthorized();
    }
}
