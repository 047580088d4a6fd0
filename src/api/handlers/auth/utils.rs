//! Small helpers for auth validation and reset token handling.

use anyhow::{Context, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Reset tokens carry 160 bits of entropy and travel as 40 hex characters.
const RESET_TOKEN_BYTES: usize = 20;

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Display names are 2..=255 characters after trimming.
pub(crate) fn valid_username(username: &str) -> bool {
    let len = username.trim().chars().count();
    (2..=255).contains(&len)
}

/// Minimum length check for new passwords.
pub(crate) fn valid_new_password(password: &str) -> bool {
    password.chars().count() >= 6
}

/// Create a new reset token for email links.
///
/// Returned token is only sent to the user; we store a hash in the database.
pub(super) fn generate_reset_token() -> Result<String> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset token")?;
    Ok(hex::encode(bytes))
}

/// Hash a reset token so we never store the raw token in the database.
/// The hash is used for lookups when the link is followed.
pub(super) fn hash_reset_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the frontend reset link included in outbound emails.
pub(super) fn build_reset_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/reset/{token}")
}

/// Extract a bearer token from the `Authorization` header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_username_bounds() {
        assert!(!valid_username("a"));
        assert!(valid_username("ab"));
        assert!(valid_username(&"x".repeat(255)));
        assert!(!valid_username(&"x".repeat(256)));
    }

    #[test]
    fn valid_new_password_minimum_length() {
        assert!(!valid_new_password("12345"));
        assert!(valid_new_password("123456"));
    }

    #[test]
    fn generate_reset_token_is_40_hex_chars() {
        let token = generate_reset_token().expect("token");
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_reset_token_is_unique() {
        let first = generate_reset_token().expect("token");
        let second = generate_reset_token().expect("token");
        assert_ne!(first, second);
    }

    #[test]
    fn hash_reset_token_stable() {
        let first = hash_reset_token("token");
        let second = hash_reset_token("token");
        let different = hash_reset_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn build_reset_url_trims_trailing_slash() {
        let url = build_reset_url("https://loocate.dev/", "token");
        assert_eq!(url, "https://loocate.dev/reset/token");
    }

    #[test]
    fn extract_bearer_token_parses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_bearer_token_rejects_empty_or_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
