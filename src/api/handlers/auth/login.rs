//! Credential login endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::password::verify_password;
use super::state::AuthConfig;
use super::storage::lookup_credentials;
use super::token::{sign, TokenScope};
use super::types::{ErrorResponse, LoginRequest, TokenResponse};
use super::utils::{normalize_email, valid_email};

#[utoipa::path(
    post,
    path = "/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted, session token issued", body = TokenResponse),
        (status = 400, description = "Validation failed or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Store or signing failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
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
    if request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field("password", "Password is required")),
        )
            .into_response();
    }

    let record = match lookup_credentials(&pool, &email).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            // Unknown email and wrong password answer identically; the
            // distinction stays in the logs to block account enumeration.
            warn!("Login failed: no account for email");
            return invalid_credentials();
        }
        Err(err) => {
            error!("Failed to lookup credentials: {err}");
            return server_error();
        }
    };

    match verify_password(&request.password, &record.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(account_id = %record.id, "Login failed: password mismatch");
            return invalid_credentials();
        }
        Err(err) => {
            error!(account_id = %record.id, "Stored password hash is unusable: {err}");
            return server_error();
        }
    }

    match sign(
        &auth_config,
        record.id,
        TokenScope::Session,
        auth_config.session_ttl_seconds(),
    ) {
        Ok(token) => (StatusCode::OK, Json(TokenResponse { token })).into_response(),
        Err(err) => {
            error!("Failed to sign session token: {err}");
            server_error()
        }
    }
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::single("Invalid credentials")),
    )
        .into_response()
}

fn server_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::single("Server error")),
    )
        .into_response()
}
