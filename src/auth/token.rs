//! Issuing and verifying the JSON Web Tokens used for API authentication.
//!
//! Two kinds of token exist: short-lived access tokens that authenticate API
//! requests, and longer-lived refresh tokens that can only be exchanged for a
//! new access token. The kind is carried in a `token_type` claim so that one
//! kind can never be used in place of the other.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, models::UserID};

/// How long an access token is valid for.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::minutes(5);

/// How long a refresh token is valid for.
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::hours(24);

/// The keys for signing and verifying JWTs, derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create signing and verification keys from a `secret` string.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The kind of a token, stored in its `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A short-lived token that authenticates API requests.
    Access,
    /// A longer-lived token that can only be exchanged for a new access token.
    Refresh,
}

impl TokenKind {
    fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => ACCESS_TOKEN_LIFETIME,
            TokenKind::Refresh => REFRESH_TOKEN_LIFETIME,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    token_type: String,
}

/// An access and refresh token issued together at log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    /// The access token.
    pub access: String,
    /// The refresh token.
    pub refresh: String,
}

/// Issue a signed token of the given `kind` for `user_id`.
///
/// `now` is passed in rather than read from the system clock so that expiry
/// behaviour can be tested.
///
/// # Errors
/// Returns an [Error::InvalidToken] if the token could not be signed.
pub fn issue_token(
    user_id: UserID,
    kind: TokenKind,
    keys: &JwtKeys,
    now: OffsetDateTime,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.as_i64().to_string(),
        iat: now.unix_timestamp(),
        exp: (now + kind.lifetime()).unix_timestamp(),
        token_type: kind.as_str().to_string(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key).map_err(|error| {
        tracing::error!("Could not sign {} token: {}", kind.as_str(), error);
        Error::InvalidToken
    })
}

/// Issue the access and refresh token pair returned at log in.
///
/// # Errors
/// Returns an [Error::InvalidToken] if a token could not be signed.
pub fn issue_token_pair(
    user_id: UserID,
    keys: &JwtKeys,
    now: OffsetDateTime,
) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access: issue_token(user_id, TokenKind::Access, keys, now)?,
        refresh: issue_token(user_id, TokenKind::Refresh, keys, now)?,
    })
}

/// Verify a token's signature, expiry and kind, and return the user ID it
/// was issued for.
///
/// # Errors
/// Returns an [Error::InvalidToken] if the token is malformed, has an invalid
/// signature, has expired, or is not of the `expected_kind`.
pub fn verify_token(
    token: &str,
    expected_kind: TokenKind,
    keys: &JwtKeys,
) -> Result<UserID, Error> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &keys.decoding_key, &validation).map_err(|error| {
        tracing::debug!("Token verification failed: {}", error);
        Error::InvalidToken
    })?;

    if token_data.claims.token_type != expected_kind.as_str() {
        return Err(Error::InvalidToken);
    }

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| Error::InvalidToken)
}
