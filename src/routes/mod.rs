//! This module defines the REST API routes and how to handle each of them.

pub mod endpoints;
mod log_in;
mod register;
mod transaction;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::auth_guard,
    stores::{TransactionStore, UserStore},
};

pub use log_in::{AccessToken, Credentials, RefreshData, log_in, refresh_token};
pub use register::{RegisterData, RegisterResponse, register};
pub use transaction::{
    TransactionData, TransactionDetail, TransactionListItem, TransactionPatch,
    create_transaction, delete_transaction, get_transaction, list_transactions,
    patch_transaction, update_transaction,
};

/// Return the router for the REST API.
///
/// The transaction routes sit behind the auth middleware; the account routes
/// do not, since their callers do not have a token yet.
pub fn build_router<T, U>(state: AppState<T, U>) -> Router
where
    T: TransactionStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::REFRESH_TOKEN, post(refresh_token));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions).post(create_transaction),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction)
                .put(update_transaction)
                .patch(patch_transaction)
                .delete(delete_transaction),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_guard::<T, U>,
        ));

    protected_routes.merge(unprotected_routes).with_state(state)
}
