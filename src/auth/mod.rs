//! This module implements authentication and authorization: JWT issuance and
//! verification, the route guard that turns a bearer token into an [Actor],
//! and the owner-or-admin access policy.

mod middleware;
mod policy;
mod token;

pub use middleware::auth_guard;
pub use policy::{Actor, can_access};
pub use token::{
    ACCESS_TOKEN_LIFETIME, JwtKeys, REFRESH_TOKEN_LIFETIME, TokenKind, TokenPair, issue_token,
    issue_token_pair, verify_token,
};
