//! Defines the state of the application which is shared across route handlers.

use crate::{
    auth::JwtKeys,
    stores::{TransactionStore, UserStore},
};

/// The state of the application shared across all route handlers.
///
/// The stores are trait parameters so that tests can swap in lightweight
/// in-memory implementations.
#[derive(Clone)]
pub struct AppState<T, U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    /// The keys used to sign and verify JSON Web Tokens.
    pub jwt_keys: JwtKeys,
    /// The store for transactions.
    pub transaction_store: T,
    /// The store for users.
    pub user_store: U,
}

impl<T, U> AppState<T, U>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    /// Create the application state, deriving the signing keys from
    /// `jwt_secret`.
    pub fn new(jwt_secret: &str, transaction_store: T, user_store: U) -> Self {
        Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            transaction_store,
            user_store,
        }
    }
}
