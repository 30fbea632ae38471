//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, params};

use crate::{
    Error,
    db::MapRow,
    models::{NewUser, User, UserID},
    stores::UserStore,
};

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create a new user in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateUsername] if the username is already taken,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO user (username, email, password_hash, is_admin)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, username, email, password_hash, is_admin",
            )?
            .query_one(
                params![
                    new_user.username,
                    new_user.email.to_string(),
                    new_user.password_hash.to_string(),
                    new_user.is_admin,
                ],
                User::map_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error {
                        code: _,
                        extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                    },
                    _,
                ) => Error::DuplicateUsername,
                error => error.into(),
            })?;

        Ok(user)
    }

    /// Get the user with the specified `id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid user,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get_by_id(&self, id: UserID) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, username, email, password_hash, is_admin
                 FROM user WHERE id = :id",
            )?
            .query_one(&[(":id", &id.as_i64())], User::map_row)?;

        Ok(user)
    }

    /// Get the user with the specified `username` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no user has the given username,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get_by_username(&self, username: &str) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, username, email, password_hash, is_admin
                 FROM user WHERE username = :username",
            )?
            .query_one(&[(":username", &username)], User::map_row)?;

        Ok(user)
    }
}
