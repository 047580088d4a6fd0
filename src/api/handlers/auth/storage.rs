//! Database helpers for accounts and reset state.
//!
//! The reset token columns are only ever written as a pair: a request sets
//! hash and expiry together, and a consume clears both in the same UPDATE, so
//! a token without a deadline can never exist.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(crate) enum RegisterOutcome {
    Created(Uuid),
    Conflict,
}

/// Minimal fields needed to check a login.
pub(super) struct CredentialRecord {
    pub(super) id: Uuid,
    pub(super) password_hash: String,
}

/// Account as loaded for its owner; excludes the password hash.
pub(super) struct AccountRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) username: String,
    pub(super) avatar_url: Option<String>,
    pub(super) phone_number: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

/// Identity fields checked before a reset token is issued.
pub(super) struct ResetIdentity {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) phone_number: Option<String>,
}

pub(crate) async fn insert_account(
    pool: &PgPool,
    email: &str,
    username: &str,
    password_hash: &str,
    phone_number: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<RegisterOutcome> {
    let query = r"
        INSERT INTO accounts
            (email, username, password_hash, phone_number, avatar_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(phone_number)
        .bind(avatar_url)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegisterOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Look up credentials by normalized email (used by login).
pub(super) async fn lookup_credentials(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialRecord>> {
    let query = "SELECT id, password_hash FROM accounts WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        id: row.get("id"),
        password_hash: row.get("password_hash"),
    }))
}

pub(super) async fn fetch_account(pool: &PgPool, id: Uuid) -> Result<Option<AccountRecord>> {
    let query = r"
        SELECT id, email, username, avatar_url, phone_number, created_at
        FROM accounts
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account")?;

    Ok(row.map(|row| AccountRecord {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        avatar_url: row.get("avatar_url"),
        phone_number: row.get("phone_number"),
        created_at: row.get("created_at"),
    }))
}

pub(super) async fn lookup_reset_identity(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ResetIdentity>> {
    let query = "SELECT id, email, phone_number FROM accounts WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup reset identity")?;

    Ok(row.map(|row| ResetIdentity {
        id: row.get("id"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
    }))
}

/// Store a reset token hash and its expiry on the account row.
///
/// Runs inside the caller's transaction so the token is only persisted if the
/// reset mail is accepted for delivery. Overwrites any outstanding token:
/// last write wins, a newer request silently invalidates the older link.
pub(super) async fn store_reset_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET reset_token_hash = $2,
            reset_token_expires_at = NOW() + ($3 * INTERVAL '1 second')
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to store reset token")?;
    Ok(())
}

/// Find the account holding an unexpired reset token.
///
/// Expiry is strict: a token looked up at exactly its deadline is gone.
pub(super) async fn lookup_account_by_reset_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<(Uuid, DateTime<Utc>)>> {
    let query = r"
        SELECT id, reset_token_expires_at
        FROM accounts
        WHERE reset_token_hash = $1
          AND reset_token_expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup reset token")?;

    Ok(row.map(|row| (row.get("id"), row.get("reset_token_expires_at"))))
}

/// Replace the password hash and clear the reset token pair unconditionally.
///
/// Returns `false` if the account no longer exists.
pub(super) async fn update_password_and_clear_reset(
    pool: &PgPool,
    account_id: Uuid,
    password_hash: &str,
) -> Result<bool> {
    let query = r"
        UPDATE accounts
        SET password_hash = $2,
            reset_token_hash = NULL,
            reset_token_expires_at = NULL
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(account_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;

    Ok(result.rows_affected() > 0)
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
