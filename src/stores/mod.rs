//! This module defines the traits for persisting the domain models and their
//! SQLite implementations.
//!
//! The traits keep the route handlers independent of the storage backend, so
//! tests can run against an in-memory database.

mod sqlite;
mod transaction;
mod user;

pub use sqlite::{SQLiteTransactionStore, SQLiteUserStore};
pub use transaction::TransactionStore;
pub use user::UserStore;
