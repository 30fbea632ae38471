//! The object-level access policy: a transaction may be seen or changed by
//! its owner or by an admin, and nobody else.

use crate::models::{Transaction, UserID};

/// An authenticated caller, as established by the
/// [auth guard](crate::auth::auth_guard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The ID of the authenticated user.
    pub id: UserID,
    /// Whether the user can see and modify other users' transactions.
    pub is_admin: bool,
}

/// Whether `actor` may retrieve, update or delete `transaction`.
///
/// Admins may access any transaction; everyone else only their own. The same
/// predicate gates every non-list operation, so there is a single place where
/// the ownership rule lives.
pub fn can_access(actor: &Actor, transaction: &Transaction) -> bool {
    actor.is_admin || actor.id == transaction.owner_id
}
