//! The routes for creating, listing, retrieving, updating and deleting
//! transactions.
//!
//! Every handler here sits behind the auth middleware, so an [Actor] is
//! always available. Handlers check ownership against the fetched record and
//! respond with 404 when it fails, so the API does not reveal which IDs
//! exist.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{Actor, can_access},
    models::{
        DatabaseID, TaxType, Transaction, TransactionDraft, TransactionType, validate_money,
        validate_title,
    },
    stores::{TransactionStore, UserStore},
};

/// The data submitted when creating a transaction or replacing one with PUT.
///
/// The owner is never part of the payload; it is bound from the
/// authenticated user at creation time and fixed afterwards.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    /// A short label for the transaction.
    pub title: String,
    /// An optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// The amount of money spent or earned.
    pub amount: Decimal,
    /// Whether money was earned (credit) or spent (debit).
    pub transaction_type: TransactionType,
    /// The tax on the transaction. Defaults to 0.00.
    #[serde(default)]
    pub tax: Option<Decimal>,
    /// How the tax combines with the amount. Defaults to flat.
    #[serde(default)]
    pub tax_type: Option<TaxType>,
}

/// The data submitted when partially updating a transaction with PATCH.
///
/// Absent fields keep their stored value. `description` distinguishes an
/// absent field from an explicit null, which clears it.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPatch {
    /// A new title for the transaction.
    #[serde(default)]
    pub title: Option<String>,
    /// A new description, where an explicit null clears the stored one.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// A new amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// A new transaction type.
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    /// A new tax value.
    #[serde(default)]
    pub tax: Option<Decimal>,
    /// A new tax type.
    #[serde(default)]
    pub tax_type: Option<TaxType>,
}

/// Wrap a present value in `Some` so that an absent field and an explicit
/// null can be told apart.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// A transaction as rendered in list responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListItem {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// A short label for the transaction.
    pub title: String,
    /// The amount of money spent or earned.
    pub amount: Decimal,
    /// Whether money was earned (credit) or spent (debit).
    pub transaction_type: TransactionType,
    /// The amount with tax applied, recomputed for every response.
    pub total: Decimal,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Transaction> for TransactionListItem {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            title: transaction.title.clone(),
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            total: transaction.total(),
            created_at: transaction.created_at,
        }
    }
}

/// A transaction as rendered in single-record responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionDetail {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// The username of the owner.
    pub user: String,
    /// A short label for the transaction.
    pub title: String,
    /// An optional longer description.
    pub description: Option<String>,
    /// The amount of money spent or earned.
    pub amount: Decimal,
    /// Whether money was earned (credit) or spent (debit).
    pub transaction_type: TransactionType,
    /// The tax on the transaction.
    pub tax: Decimal,
    /// How the tax combines with the amount.
    pub tax_type: TaxType,
    /// The amount with tax applied, recomputed for every response.
    pub total: Decimal,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn to_detail<U>(transaction: Transaction, user_store: &U) -> Result<TransactionDetail, Error>
where
    U: UserStore,
{
    let owner = user_store.get_by_id(transaction.owner_id)?;
    let total = transaction.total();

    Ok(TransactionDetail {
        id: transaction.id,
        user: owner.username,
        title: transaction.title,
        description: transaction.description,
        amount: transaction.amount,
        transaction_type: transaction.transaction_type,
        tax: transaction.tax,
        tax_type: transaction.tax_type,
        total,
        created_at: transaction.created_at,
        updated_at: transaction.updated_at,
    })
}

/// Fetch a transaction and check the actor may act on it.
///
/// A failed ownership check maps to a 404 response, the same as a missing
/// record.
fn get_accessible_transaction<T>(
    store: &T,
    actor: &Actor,
    transaction_id: DatabaseID,
) -> Result<Transaction, Error>
where
    T: TransactionStore,
{
    let transaction = store.get(transaction_id)?;

    if !can_access(actor, &transaction) {
        return Err(Error::NotAuthorized);
    }

    Ok(transaction)
}

/// Handler for listing transactions, most recent first.
///
/// Regular users see only their own transactions; admins see everyone's.
pub async fn list_transactions<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let transactions = if actor.is_admin {
        state.transaction_store.get_all()?
    } else {
        state.transaction_store.get_by_owner(actor.id)?
    };

    let items: Vec<TransactionListItem> = transactions.iter().map(Into::into).collect();

    Ok(Json(items))
}

/// Handler for creating a transaction owned by the authenticated user.
///
/// # Errors
///
/// Returns a 400 response naming the offending field if the title or a
/// monetary value fails validation.
pub async fn create_transaction<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
    Json(data): Json<TransactionData>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let draft = TransactionDraft::new(
        actor.id,
        data.title,
        data.description,
        data.amount,
        data.transaction_type,
        data.tax,
        data.tax_type,
        OffsetDateTime::now_utc(),
    )?;

    let transaction = state.transaction_store.create(draft)?;

    Ok((
        StatusCode::CREATED,
        Json(to_detail(transaction, &state.user_store)?),
    ))
}

/// Handler for retrieving a single transaction.
pub async fn get_transaction<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let transaction = get_accessible_transaction(&state.transaction_store, &actor, transaction_id)?;

    Ok(Json(to_detail(transaction, &state.user_store)?))
}

/// Handler for replacing the mutable fields of a transaction with PUT.
///
/// The payload goes through the same validation and defaulting as creation.
/// The owner and creation timestamp are kept; `updated_at` is refreshed.
pub async fn update_transaction<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
    Path(transaction_id): Path<DatabaseID>,
    Json(data): Json<TransactionData>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let mut transaction =
        get_accessible_transaction(&state.transaction_store, &actor, transaction_id)?;

    let draft = TransactionDraft::new(
        transaction.owner_id,
        data.title,
        data.description,
        data.amount,
        data.transaction_type,
        data.tax,
        data.tax_type,
        transaction.created_at,
    )?;

    transaction.title = draft.title;
    transaction.description = draft.description;
    transaction.amount = draft.amount;
    transaction.transaction_type = draft.transaction_type;
    transaction.tax = draft.tax;
    transaction.tax_type = draft.tax_type;

    let transaction = state
        .transaction_store
        .save_revision(transaction, OffsetDateTime::now_utc())?;

    Ok(Json(to_detail(transaction, &state.user_store)?))
}

/// Handler for partially updating a transaction with PATCH.
///
/// Only the fields present in the payload change; each one goes through the
/// same validation as creation. `updated_at` is refreshed.
pub async fn patch_transaction<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
    Path(transaction_id): Path<DatabaseID>,
    Json(patch): Json<TransactionPatch>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let mut transaction =
        get_accessible_transaction(&state.transaction_store, &actor, transaction_id)?;

    if let Some(title) = patch.title {
        validate_title(&title)?;
        transaction.title = title;
    }

    if let Some(description) = patch.description {
        transaction.description = description;
    }

    if let Some(amount) = patch.amount {
        transaction.amount = validate_money("amount", amount)?;
    }

    if let Some(transaction_type) = patch.transaction_type {
        transaction.transaction_type = transaction_type;
    }

    if let Some(tax) = patch.tax {
        transaction.tax = validate_money("tax", tax)?;
    }

    if let Some(tax_type) = patch.tax_type {
        transaction.tax_type = tax_type;
    }

    let transaction = state
        .transaction_store
        .save_revision(transaction, OffsetDateTime::now_utc())?;

    Ok(Json(to_detail(transaction, &state.user_store)?))
}

/// Handler for deleting a transaction.
///
/// Responds with 204 No Content on success.
pub async fn delete_transaction<T, U>(
    State(state): State<AppState<T, U>>,
    Extension(actor): Extension<Actor>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error>
where
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let transaction = get_accessible_transaction(&state.transaction_store, &actor, transaction_id)?;

    state.transaction_store.delete(transaction.id)?;

    Ok(StatusCode::NO_CONTENT)
}
