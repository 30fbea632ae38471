/*! This module defines and implements traits for interacting with the application's database. */

use rusqlite::{Connection, Row};
use time::{OffsetDateTime, error::ComponentRange};

use crate::models::{Transaction, User};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type that the row is mapped to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// # Errors
    /// Returns an error if a column is missing or cannot be converted.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading columns starting from `offset`.
    ///
    /// # Errors
    /// Returns an error if a column is missing or cannot be converted.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the tables for the domain models in the database.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    User::create_table(connection)?;
    Transaction::create_table(connection)?;

    Ok(())
}

/// Encode a timestamp as unix nanoseconds for storage.
///
/// Timestamps are stored as integers instead of RFC 3339 text because text
/// timestamps with variable-length subseconds do not order correctly under
/// SQLite's lexicographic TEXT comparison, and the list query sorts on
/// `created_at`.
///
/// # Panics
/// Panics if the timestamp does not fit in an `i64` of nanoseconds, which
/// bounds the supported range to the years 1677 through 2262. Timestamps are
/// always taken from the server clock, so this cannot happen in practice.
pub(crate) fn timestamp_to_nanos(timestamp: OffsetDateTime) -> i64 {
    i64::try_from(timestamp.unix_timestamp_nanos())
        .expect("timestamp is outside the storable range (1677 to 2262)")
}

/// Decode a stored unix nanosecond timestamp.
///
/// # Errors
/// Returns an error if `nanos` is outside the range `OffsetDateTime` supports.
pub(crate) fn timestamp_from_nanos(nanos: i64) -> Result<OffsetDateTime, ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database.");

        let mut statement = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .unwrap();
        let mut table_names: Vec<String> = statement
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        table_names.sort();

        assert_eq!(table_names, vec!["transaction", "user"]);
    }

    #[test]
    fn timestamps_round_trip_through_nanos() {
        let now = time::OffsetDateTime::now_utc();

        let round_tripped = super::timestamp_from_nanos(super::timestamp_to_nanos(now)).unwrap();

        assert_eq!(round_tripped, now);
    }

    #[test]
    fn far_future_timestamp_fits_in_storage() {
        let far_future = time::macros::datetime!(2262-01-01 00:00:00 UTC);

        let round_tripped =
            super::timestamp_from_nanos(super::timestamp_to_nanos(far_future)).unwrap();

        assert_eq!(round_tripped, far_future);
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database.");
        initialize(&connection).expect("Second initialize should not fail.");
    }
}
