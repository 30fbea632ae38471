//! This module defines the domain models of the application.

mod password;
mod transaction;
mod user;

pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{
    DatabaseID, TaxType, Transaction, TransactionDraft, TransactionType, total, validate_money,
    validate_title,
};
pub use user::{NewUser, User, UserID};
