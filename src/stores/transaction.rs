//! Defines the transaction store trait.

use time::OffsetDateTime;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionDraft, UserID},
};

/// Handles the creation, retrieval and mutation of transactions.
///
/// Implementations must return collections ordered by `created_at`
/// descending, with ties broken by insertion order (ascending ID), so that
/// the most recent transactions come first.
pub trait TransactionStore {
    /// Create a new transaction in the store from a validated draft.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if the draft's owner is not in the store,
    /// or an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&self, draft: TransactionDraft) -> Result<Transaction, Error>;

    /// Retrieve a transaction from the store by its ID.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to a stored
    /// transaction, or an [Error::SqlError] if there is an unexpected SQL
    /// error.
    fn get(&self, id: DatabaseID) -> Result<Transaction, Error>;

    /// Retrieve every transaction in the store, most recent first.
    ///
    /// Used for admin listings, which are not scoped to an owner.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn get_all(&self) -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transactions owned by `owner_id`, most recent first.
    ///
    /// An empty vector is returned if the owner has no transactions.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn get_by_owner(&self, owner_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Write the mutable fields of `transaction` back to the store.
    ///
    /// The owner and creation timestamp are never written; callers refresh
    /// `updated_at` before calling this.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if the transaction does not exist in the
    /// store, or an [Error::SqlError] if there is an unexpected SQL error.
    fn update(&self, transaction: &Transaction) -> Result<(), Error>;

    /// Delete the transaction with the given ID.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to a stored
    /// transaction, or an [Error::SqlError] if there is an unexpected SQL
    /// error.
    fn delete(&self, id: DatabaseID) -> Result<(), Error>;

    /// Stamp `updated_at` and apply the given field values to `transaction`.
    ///
    /// This is a convenience wrapper over [TransactionStore::update] for
    /// callers that already hold the revised model.
    ///
    /// # Errors
    /// Propagates the errors of [TransactionStore::update].
    fn save_revision(
        &self,
        mut transaction: Transaction,
        now: OffsetDateTime,
    ) -> Result<Transaction, Error> {
        transaction.updated_at = now;
        self.update(&transaction)?;

        Ok(transaction)
    }
}
