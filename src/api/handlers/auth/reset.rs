//! Password reset lifecycle: request, validate, consume.
//!
//! A reset request proves control of the registered contact details, stores a
//! hashed one-time token with a one hour deadline, and mails the raw token as
//! a link. Token persistence and mail delivery share one transaction: if the
//! sender refuses the message the token is rolled back, so delivery failure
//! is loud and never leaves a live token behind.
//!
//! Validating the link trades the reset token for a short-lived bearer token
//! scoped to a single password change. Consuming that token replaces the
//! password hash and clears the reset pair in one statement.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::email::{EmailMessage, EmailSender};

use super::password::hash_password;
use super::state::AuthConfig;
use super::storage::{
    lookup_account_by_reset_token, lookup_credentials, lookup_reset_identity, store_reset_token,
    update_password_and_clear_reset,
};
use super::token::{account_id, sign, verify, TokenScope};
use super::types::{
    ErrorResponse, ForgotPasswordRequest, MessageResponse, ResetQuery, TokenResponse,
    UpdatePasswordRequest,
};
use super::utils::{
    build_reset_url, extract_bearer_token, generate_reset_token, hash_reset_token, normalize_email,
    valid_email, valid_new_password,
};

const RESET_MAIL_SUBJECT: &str = "Link To Reset Password";

#[utoipa::path(
    post,
    path = "/auth/forgotpassword",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link mailed to the registered address", body = MessageResponse),
        (status = 400, description = "Validation failed or account details do not match", body = ErrorResponse),
        (status = 502, description = "Mail delivery failed; no reset token was issued", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::single("Missing payload")),
            )
                .into_response()
        }
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field("email", "Please include a valid email")),
        )
            .into_response();
    }
    let phone_number = request.phone_number.trim();
    if phone_number.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field(
                "phone_number",
                "Please enter your phone number",
            )),
        )
            .into_response();
    }

    let identity = match lookup_reset_identity(&pool, &email).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            // Same answer as a phone mismatch; the cause stays in the logs so
            // the endpoint cannot be used to probe for registered emails.
            warn!("Reset request for unknown email");
            return identity_mismatch();
        }
        Err(err) => {
            error!("Failed to lookup account for reset: {err}");
            return server_error();
        }
    };

    if identity.phone_number.as_deref() != Some(phone_number) {
        warn!(account_id = %identity.id, "Reset request with mismatched phone number");
        return identity_mismatch();
    }

    let token = match generate_reset_token() {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to generate reset token: {err}");
            return server_error();
        }
    };
    let token_hash = hash_reset_token(&token);

    // Token persistence and mail hand-off are atomic: a delivery failure
    // rolls the token back, a store failure never sends mail.
    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            error!("Failed to start reset transaction: {err}");
            return server_error();
        }
    };

    if let Err(err) = store_reset_token(
        &mut tx,
        identity.id,
        &token_hash,
        auth_config.reset_token_ttl_seconds(),
    )
    .await
    {
        error!("Failed to store reset token: {err}");
        let _ = tx.rollback().await;
        return server_error();
    }

    let message = EmailMessage {
        to_email: identity.email.clone(),
        subject: RESET_MAIL_SUBJECT.to_string(),
        body: reset_mail_body(&build_reset_url(auth_config.frontend_base_url(), &token)),
    };

    if let Err(err) = sender.send(&message).await {
        error!(account_id = %identity.id, "Failed to send reset email: {err}");
        let _ = tx.rollback().await;
        return (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::single("Failed to send reset email")),
        )
            .into_response();
    }

    if let Err(err) = tx.commit().await {
        error!("Failed to commit reset transaction: {err}");
        return server_error();
    }

    (
        StatusCode::OK,
        Json(MessageResponse::new("Reset email sent")),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/auth/reset",
    params(
        ("token" = String, Query, description = "Reset token from the emailed link")
    ),
    responses(
        (status = 200, description = "Token accepted; bearer token scoped to a password change", body = TokenResponse),
        (status = 400, description = "Reset link is invalid or has expired", body = ErrorResponse),
        (status = 500, description = "Store or signing failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn validate_reset(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    query: Query<ResetQuery>,
) -> impl IntoResponse {
    let token = query.token.trim();
    if token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field("token", "Missing token")),
        )
            .into_response();
    }

    let token_hash = hash_reset_token(token);
    let (id, expires_at) = match lookup_account_by_reset_token(&pool, &token_hash).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::single(
                    "password reset link is invalid or has expired",
                )),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to lookup reset token: {err}");
            return server_error();
        }
    };

    // The bearer token never outlives the reset window it came from.
    let remaining = (expires_at - Utc::now()).num_seconds();
    let ttl = remaining.clamp(1, auth_config.reset_token_ttl_seconds().max(1));

    match sign(&auth_config, id, TokenScope::PasswordReset, ttl) {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(err) => {
            error!("Failed to sign reset-scoped token: {err}");
            server_error()
        }
    }
}

#[utoipa::path(
    put,
    path = "/auth/updatePasswordViaEmail",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password replaced; reset token cleared", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing or wrongly scoped bearer token, or token/account mismatch", body = ErrorResponse),
        (status = 404, description = "No account for the supplied email", body = ErrorResponse),
        (status = 500, description = "Store or hashing failure", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn update_password_via_email(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    // A validated reset token must be presented here; email alone is not
    // enough to change a password.
    let Some(bearer) = extract_bearer_token(&headers) else {
        return unauthorized("Missing or invalid reset token");
    };
    let claims = match verify(&auth_config, &bearer, TokenScope::PasswordReset) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("Reset-scoped token rejected: {err}");
            return unauthorized("Missing or invalid reset token");
        }
    };
    let token_account = match account_id(&claims) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!("Reset-scoped token subject rejected: {err}");
            return unauthorized("Missing or invalid reset token");
        }
    };

    let request: UpdatePasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::single("Missing payload")),
            )
                .into_response()
        }
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field("email", "Please include a valid email")),
        )
            .into_response();
    }
    if !valid_new_password(&request.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field(
                "password",
                "Password must be at least 6 characters",
            )),
        )
            .into_response();
    }

    let record = match lookup_credentials(&pool, &email).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::single("Account not found")),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to lookup account for password update: {err}");
            return server_error();
        }
    };

    if record.id != token_account {
        warn!(account_id = %record.id, "Reset token presented for a different account");
        return unauthorized("Reset token does not match this account");
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash new password: {err}");
            return server_error();
        }
    };

    match update_password_and_clear_reset(&pool, record.id, &password_hash).await {
        Ok(true) => (
            StatusCode::OK,
            Json(MessageResponse::new("password updated")),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::single("Account not found")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update password: {err}");
            server_error()
        }
    }
}

fn reset_mail_body(reset_url: &str) -> String {
    format!(
        "You are receiving this because you (or someone else) requested a password reset \
         for your account.\n\n\
         Please click on the following link, or paste it into your browser, to complete \
         the process within one hour of receiving it:\n\n\
         {reset_url}\n\n\
         If you did not request this, please ignore this email and your password will \
         remain unchanged.\n"
    )
}

fn identity_mismatch() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::single(
            "Account details do not match our records",
        )),
    )
        .into_response()
}

fn unauthorized(msg: &str) -> axum::response::Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::single(msg))).into_response()
}

fn server_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::single("Server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use anyhow::Result;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn auth_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new(
            SecretString::from("test-secret"),
            "https://loocate.dev".to_string(),
        ))
    }

    fn sender() -> Arc<dyn EmailSender> {
        Arc::new(LogEmailSender)
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn forgot_password_missing_payload() -> Result<()> {
        let response = forgot_password(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Extension(sender()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn forgot_password_invalid_email() -> Result<()> {
        let response = forgot_password(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Extension(sender()),
            Some(Json(ForgotPasswordRequest {
                email: "nope".to_string(),
                phone_number: "555-1111".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn forgot_password_empty_phone() -> Result<()> {
        let response = forgot_password(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Extension(sender()),
            Some(Json(ForgotPasswordRequest {
                email: "a@example.com".to_string(),
                phone_number: " ".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn validate_reset_empty_token() -> Result<()> {
        let response = validate_reset(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Query(ResetQuery {
                token: " ".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn update_password_requires_bearer() -> Result<()> {
        let response = update_password_via_email(
            HeaderMap::new(),
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Some(Json(UpdatePasswordRequest {
                email: "a@example.com".to_string(),
                password: "secret1".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn update_password_rejects_session_scope() -> Result<()> {
        let config = auth_config();
        let token = sign(&config, Uuid::new_v4(), TokenScope::Session, 3600)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        let response = update_password_via_email(
            headers,
            Extension(lazy_pool()?),
            Extension(config),
            Some(Json(UpdatePasswordRequest {
                email: "a@example.com".to_string(),
                password: "secret1".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn update_password_short_password() -> Result<()> {
        let config = auth_config();
        let token = sign(&config, Uuid::new_v4(), TokenScope::PasswordReset, 3600)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        let response = update_password_via_email(
            headers,
            Extension(lazy_pool()?),
            Extension(config),
            Some(Json(UpdatePasswordRequest {
                email: "a@example.com".to_string(),
                password: "short".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[test]
    fn reset_mail_body_contains_link_and_deadline() {
        let body = reset_mail_body("https://loocate.dev/reset/token");
        assert!(body.contains("https://loocate.dev/reset/token"));
        assert!(body.contains("within one hour"));
    }
}
