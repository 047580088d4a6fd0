//! # Loocate accounts & authentication
//!
//! `loocate` is the account backend for the Loocate public-toilet directory.
//! It owns registration, credential login, bearer-token authentication, and
//! the password-reset lifecycle.
//!
//! ## Tokens
//!
//! Session and reset credentials are signed HS256 claims tokens carrying the
//! account id, a scope, and an absolute expiry. Tokens are never persisted
//! and cannot be revoked server side; expiry is the only termination.
//!
//! ## Password reset
//!
//! A reset request stores only the SHA-256 of a 160-bit random token on the
//! account row, mails the raw token as a link, and expires it after one hour.
//! Validating the link yields a token scoped to a single password change;
//! consuming it replaces the Argon2id hash and clears the reset fields in
//! one statement. A newer reset request overwrites (and thereby invalidates)
//! any outstanding one; last write wins.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
