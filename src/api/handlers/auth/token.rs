//! Signed claims tokens for sessions and password resets.
//!
//! Tokens are HS256 JWTs carrying the account id and a scope. They are not
//! persisted and cannot be revoked; expiry is the only termination. A
//! `password_reset` token is only good for the password-change endpoint and
//! a `session` token is never accepted there, so a leaked reset link cannot
//! be traded for a full session.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::AuthConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TokenScope {
    /// Full bearer credential issued by login.
    Session,
    /// Narrow credential issued by reset-link validation; only authorizes a
    /// password change.
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// Account identifier.
    pub(crate) sub: String,
    pub(crate) scope: TokenScope,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

/// Sign a claims token for the given account.
///
/// # Errors
/// Returns an error if encoding fails; callers treat this as a server error.
pub(crate) fn sign(
    config: &AuthConfig,
    account_id: Uuid,
    scope: TokenScope,
    ttl_seconds: i64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        scope,
        iat: now,
        exp: now.saturating_add(ttl_seconds),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret().expose_secret().as_bytes()),
    )
    .context("failed to sign token")
}

/// Verify a token's signature, expiry, and scope, returning its claims.
///
/// # Errors
/// Returns an error for any invalid, expired, or wrongly scoped token;
/// callers map every failure to 401.
pub(crate) fn verify(config: &AuthConfig, token: &str, expected: TokenScope) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is strict; a token presented one second late is rejected.
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret().expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|err| anyhow!("invalid token: {err}"))?;

    if data.claims.scope != expected {
        bail!("token scope mismatch");
    }

    Ok(data.claims)
}

/// Parse the `sub` claim back into an account id.
///
/// # Errors
/// Returns an error if the claim is not a UUID.
pub(crate) fn account_id(claims: &Claims) -> Result<Uuid> {
    Uuid::parse_str(&claims.sub).context("token subject is not a valid account id")
}
