//! This file defines the type `Transaction`, the core type of the expense
//! tracking part of the application, along with its validation rules and the
//! total calculation shared by every serialized response.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow, timestamp_from_nanos},
    models::UserID,
};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;

/// The maximum number of characters allowed in a transaction title.
pub const TITLE_MAX_CHARS: usize = 200;

/// The maximum number of digits in a monetary value, counting both sides of
/// the decimal point.
const MONEY_MAX_DIGITS: usize = 10;

/// The number of fractional digits monetary values are stored and displayed with.
const MONEY_SCALE: u32 = 2;

/// Whether a transaction represents money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money flowing in, e.g. a salary payment.
    Credit,
    /// Money flowing out, e.g. a grocery shop.
    Debit,
}

impl TransactionType {
    /// The text representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(Error::InvalidField {
                field: "transaction_type",
                message: format!("\"{other}\" is not a valid transaction type"),
            }),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the tax on a transaction combines with its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// The tax is an absolute value added to the amount.
    Flat,
    /// The tax is a percentage of the amount.
    Percentage,
}

impl TaxType {
    /// The text representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxType::Flat => "flat",
            TaxType::Percentage => "percentage",
        }
    }
}

impl FromStr for TaxType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "flat" => Ok(TaxType::Flat),
            "percentage" => Ok(TaxType::Percentage),
            other => Err(Error::InvalidTaxType(other.to_string())),
        }
    }
}

impl Display for TaxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compute the display total for a transaction.
///
/// A flat tax is added to the amount as-is; a percentage tax adds
/// `amount * tax / 100`. The result has exactly two fractional digits,
/// rounded half-up. The total is never stored, so it can never go stale when
/// the amount or tax change.
pub fn total(amount: Decimal, tax: Decimal, tax_type: TaxType) -> Decimal {
    let gross = match tax_type {
        TaxType::Flat => amount + tax,
        TaxType::Percentage => amount + (amount * tax) / Decimal::ONE_HUNDRED,
    };

    let mut gross = gross.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    gross.rescale(MONEY_SCALE);

    gross
}

/// Check that a transaction title is non-empty and at most
/// [TITLE_MAX_CHARS] characters.
///
/// # Errors
/// Returns an [Error::InvalidField] naming `title` if the check fails.
pub fn validate_title(title: &str) -> Result<(), Error> {
    if title.is_empty() {
        return Err(Error::InvalidField {
            field: "title",
            message: "title cannot be empty".to_string(),
        });
    }

    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(Error::InvalidField {
            field: "title",
            message: format!("title cannot be longer than {TITLE_MAX_CHARS} characters"),
        });
    }

    Ok(())
}

/// Check that a monetary value is non-negative, has at most two fractional
/// digits and at most ten digits in total, and normalize it to exactly two
/// fractional digits.
///
/// # Errors
/// Returns an [Error::InvalidField] naming `field` if the check fails.
pub fn validate_money(field: &'static str, value: Decimal) -> Result<Decimal, Error> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::InvalidField {
            field,
            message: format!("{field} cannot be negative"),
        });
    }

    if value.scale() > MONEY_SCALE {
        return Err(Error::InvalidField {
            field,
            message: format!("{field} cannot have more than {MONEY_SCALE} decimal places"),
        });
    }

    let mut value = value;
    value.rescale(MONEY_SCALE);

    if value.mantissa().unsigned_abs().to_string().len() > MONEY_MAX_DIGITS {
        return Err(Error::InvalidField {
            field,
            message: format!("{field} cannot have more than {MONEY_MAX_DIGITS} digits"),
        });
    }

    Ok(value)
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// The owner is bound at creation time from the authenticated user and never
/// changes afterwards. Timestamps are passed in by the caller so that the
/// model stays testable without a real clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// The ID of the user that owns this transaction.
    pub owner_id: UserID,
    /// A short label for the transaction.
    pub title: String,
    /// An optional longer description of the transaction.
    pub description: Option<String>,
    /// The amount of money spent or earned in this transaction.
    pub amount: Decimal,
    /// Whether money was earned (credit) or spent (debit).
    pub transaction_type: TransactionType,
    /// The tax on the transaction, interpreted according to `tax_type`.
    pub tax: Decimal,
    /// How `tax` combines with `amount`.
    pub tax_type: TaxType,
    /// When the transaction record was created.
    pub created_at: OffsetDateTime,
    /// When the transaction record was last modified.
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// The display total for this transaction, recomputed on every call.
    pub fn total(&self) -> Decimal {
        total(self.amount, self.tax, self.tax_type)
    }
}

/// A validated transaction that has not been stored yet.
///
/// Produced by [TransactionDraft::new] and consumed by
/// [TransactionStore::create](crate::stores::TransactionStore::create), which
/// assigns the ID.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// The ID of the user that will own the transaction.
    pub owner_id: UserID,
    /// A short label for the transaction.
    pub title: String,
    /// An optional longer description of the transaction.
    pub description: Option<String>,
    /// The amount of money spent or earned.
    pub amount: Decimal,
    /// Whether money was earned (credit) or spent (debit).
    pub transaction_type: TransactionType,
    /// The tax on the transaction.
    pub tax: Decimal,
    /// How the tax combines with the amount.
    pub tax_type: TaxType,
    /// The creation timestamp, also used as the initial `updated_at`.
    pub created_at: OffsetDateTime,
}

impl TransactionDraft {
    /// Create and validate a new transaction draft.
    ///
    /// `tax` defaults to 0.00 and `tax_type` to flat when not given. `now` is
    /// the timestamp stamped as both `created_at` and the initial
    /// `updated_at`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidField] naming the offending field if the
    /// title or a monetary value fails validation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: UserID,
        title: String,
        description: Option<String>,
        amount: Decimal,
        transaction_type: TransactionType,
        tax: Option<Decimal>,
        tax_type: Option<TaxType>,
        now: OffsetDateTime,
    ) -> Result<Self, Error> {
        validate_title(&title)?;
        let amount = validate_money("amount", amount)?;
        let tax = match tax {
            Some(tax) => validate_money("tax", tax)?,
            None => Decimal::new(0, MONEY_SCALE),
        };

        Ok(Self {
            owner_id,
            title,
            description,
            amount,
            transaction_type,
            tax,
            tax_type: tax_type.unwrap_or(TaxType::Flat),
            created_at: now,
        })
    }
}

impl CreateTable for Transaction {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    amount TEXT NOT NULL,
                    transaction_type TEXT NOT NULL,
                    tax TEXT NOT NULL DEFAULT '0.00',
                    tax_type TEXT NOT NULL DEFAULT 'flat',
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        // Covers the list query, which filters by owner and sorts by recency.
        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transaction_owner_created
             ON \"transaction\"(owner_id, created_at)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Transaction {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            owner_id: UserID::new(row.get(offset + 1)?),
            title: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            amount: money_from_row(row, offset + 4)?,
            transaction_type: parse_from_row::<TransactionType>(row, offset + 5)?,
            tax: money_from_row(row, offset + 6)?,
            tax_type: parse_from_row::<TaxType>(row, offset + 7)?,
            created_at: timestamp_from_row(row, offset + 8)?,
            updated_at: timestamp_from_row(row, offset + 9)?,
        })
    }
}

fn money_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    text.parse::<Decimal>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

fn parse_from_row<T>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = Error>,
{
    let text: String = row.get(index)?;

    text.parse::<T>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

fn timestamp_from_row(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    timestamp_from_nanos(row.get(index)?)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error)))
}
