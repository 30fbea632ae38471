//! Defines the user store trait.

use crate::{
    Error,
    models::{NewUser, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user in the store.
    ///
    /// # Errors
    /// Returns an [Error::DuplicateUsername] if the username is already
    /// taken, or an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&self, new_user: NewUser) -> Result<User, Error>;

    /// Retrieve a user from the store by their ID.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if `id` does not refer to a stored user,
    /// or an [Error::SqlError] if there is an unexpected SQL error.
    fn get_by_id(&self, id: UserID) -> Result<User, Error>;

    /// Retrieve a user from the store by their username.
    ///
    /// # Errors
    /// Returns an [Error::NotFound] if no user has the given username, or an
    /// [Error::SqlError] if there is an unexpected SQL error.
    fn get_by_username(&self, username: &str) -> Result<User, Error>;
}
