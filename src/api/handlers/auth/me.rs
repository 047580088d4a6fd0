//! Current-account resolution from a bearer session token.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::state::AuthConfig;
use super::storage::fetch_account;
use super::token::{account_id, verify, TokenScope};
use super::types::{AccountResponse, ErrorResponse};
use super::utils::extract_bearer_token;

#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 200, description = "Account for the presented session token", body = AccountResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn current_account(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return unauthorized();
    };

    let claims = match verify(&auth_config, &token, TokenScope::Session) {
        Ok(claims) => claims,
        Err(err) => {
            // Expired and tampered tokens land here; both are a plain 401.
            tracing::debug!("Session token rejected: {err}");
            return unauthorized();
        }
    };

    let id = match account_id(&claims) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!("Session token subject rejected: {err}");
            return unauthorized();
        }
    };

    match fetch_account(&pool, id).await {
        Ok(Some(account)) => {
            let response = AccountResponse {
                id: account.id.to_string(),
                email: account.email,
                username: account.username,
                avatar_url: account.avatar_url,
                phone_number: account.phone_number,
                created_at: account.created_at.to_rfc3339(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::single("Account not found")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to fetch account: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::single("Server error")),
            )
                .into_response()
        }
    }
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::single("Missing or invalid token")),
    )
        .into_response()
}
