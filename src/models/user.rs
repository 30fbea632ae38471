//! This file defines a user of the application and its supporting types.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{
    db::{CreateTable, MapRow},
    models::PasswordHash,
};

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better
/// compile time errors, and more flexible generics that can have distinct
/// implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from a raw integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw integer value of the user ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// Admin users can see and modify every transaction; everyone else is scoped
/// to their own records.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserID,
    /// The unique name the user logs in with, also used as their display name.
    pub username: String,
    /// The user's email address.
    pub email: EmailAddress,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
    /// Whether the user can see and modify other users' transactions.
    pub is_admin: bool,
}

/// The data required to create a new user.
///
/// The ID is assigned by the store on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's email address.
    pub email: EmailAddress,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
    /// Whether the user can see and modify other users' transactions.
    pub is_admin: bool,
}

impl CreateTable for User {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL,
                    email TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    is_admin INTEGER NOT NULL DEFAULT 0
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for User {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let email_text: String = row.get(offset + 2)?;
        let email = EmailAddress::from_str(&email_text).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 2, Type::Text, Box::new(error))
        })?;

        let raw_password_hash: String = row.get(offset + 3)?;

        Ok(Self {
            id: UserID::new(row.get(offset)?),
            username: row.get(offset + 1)?,
            email,
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            is_admin: row.get(offset + 4)?,
        })
    }
}
