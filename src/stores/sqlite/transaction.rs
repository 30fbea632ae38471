//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params};

use crate::{
    Error,
    db::{MapRow, timestamp_to_nanos},
    models::{DatabaseID, Transaction, TransactionDraft, UserID},
    stores::TransactionStore,
};

const COLUMNS: &str =
    "id, owner_id, title, description, amount, transaction_type, tax, tax_type, created_at, updated_at";

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction references the
/// [User](crate::models::User) model, the user table must be set up in the
/// database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the draft's owner no longer exists in the
    ///   database (the record the token referred to has gone away),
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&self, draft: TransactionDraft) -> Result<Transaction, Error> {
        let created_at = timestamp_to_nanos(draft.created_at);

        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO \"transaction\"
                 (owner_id, title, description, amount, transaction_type, tax, tax_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 RETURNING {COLUMNS}"
            ))?
            .query_one(
                params![
                    draft.owner_id.as_i64(),
                    draft.title,
                    draft.description,
                    draft.amount.to_string(),
                    draft.transaction_type.as_str(),
                    draft.tax.to_string(),
                    draft.tax_type.as_str(),
                    created_at,
                    created_at,
                ],
                Transaction::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error {
                        code: _,
                        extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                    },
                    _,
                ) => Error::NotFound,
                error => error.into(),
            })?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_one(&[(":id", &id)], Transaction::map_row)?;

        Ok(transaction)
    }

    /// Retrieve every transaction in the database, most recent first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" ORDER BY created_at DESC, id ASC"
            ))?
            .query_map([], Transaction::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Retrieve the transactions owned by `owner_id`, most recent first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\"
                 WHERE owner_id = :owner_id
                 ORDER BY created_at DESC, id ASC"
            ))?
            .query_map(&[(":owner_id", &owner_id.as_i64())], Transaction::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Write the mutable fields of `transaction` back to the database.
    ///
    /// The owner and creation timestamp columns are deliberately absent from
    /// the UPDATE statement; they are fixed at creation time.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the transaction is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&self, transaction: &Transaction) -> Result<(), Error> {
        let rows_updated = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET title = ?1, description = ?2, amount = ?3, transaction_type = ?4,
                 tax = ?5, tax_type = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                transaction.title,
                transaction.description,
                transaction.amount.to_string(),
                transaction.transaction_type.as_str(),
                transaction.tax.to_string(),
                transaction.tax_type.as_str(),
                timestamp_to_nanos(transaction.updated_at),
                transaction.id,
            ],
        )?;

        if rows_updated == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the transaction with the given ID.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}
