//! The endpoints for the REST API.
//!
//! Centralising the paths here keeps the router and the tests in sync.

/// Create a new user account.
pub const REGISTER: &str = "/api/auth/register";

/// Exchange credentials for an access and refresh token pair.
pub const LOG_IN: &str = "/api/auth/login";

/// Exchange a refresh token for a new access token.
pub const REFRESH_TOKEN: &str = "/api/auth/refresh";

/// The transaction collection: list on GET, create on POST.
pub const TRANSACTIONS: &str = "/api/expenses";

/// A single transaction: retrieve, update, patch or delete.
pub const TRANSACTION: &str = "/api/expenses/{transaction_id}";

/// Format the path for the transaction with the given ID.
pub fn format_transaction(transaction_id: i64) -> String {
    TRANSACTION.replace("{transaction_id}", &transaction_id.to_string())
}
