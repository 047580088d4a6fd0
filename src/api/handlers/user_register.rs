use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::handlers::auth::{
    password::hash_password,
    storage::{insert_account, RegisterOutcome},
    token::{sign, TokenScope},
    types::{ErrorResponse, RegisterRequest, TokenResponse},
    utils::{normalize_email, valid_email, valid_new_password, valid_username},
    AuthConfig,
};

#[utoipa::path(
    post,
    path= "/users",
    request_body = RegisterRequest,
    responses (
        (status = 201, description = "Account created; session token issued", body = TokenResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Account with the specified email already exists", body = ErrorResponse),
        (status = 500, description = "Store or hashing failure", body = ErrorResponse)
    ),
    tag= "accounts"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
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
    let username = request.username.trim();
    if !valid_username(username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::field(
                "username",
                "Username must be between 2 and 255 characters",
            )),
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

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::single("Server error")),
            )
                .into_response();
        }
    };

    let outcome = insert_account(
        &pool,
        &email,
        username,
        &password_hash,
        request.phone_number.as_deref(),
        request.avatar_url.as_deref(),
    )
    .await;

    let account_id = match outcome {
        Ok(RegisterOutcome::Created(id)) => id,
        Ok(RegisterOutcome::Conflict) => {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse::single("Account already exists")),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to insert account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::single("Server error")),
            )
                .into_response();
        }
    };

    // Freshly registered accounts are logged in right away.
    match sign(
        &auth_config,
        account_id,
        TokenScope::Session,
        auth_config.session_ttl_seconds(),
    ) {
        Ok(token) => (StatusCode::CREATED, Json(TokenResponse { token })).into_response(),
        Err(err) => {
            error!("Failed to sign session token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::single("Server error")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn auth_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new(
            SecretString::from("test-secret"),
            "https://loocate.dev".to_string(),
        ))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "a@example.com".to_string(),
            username: "alice".to_string(),
            password: "secret1".to_string(),
            phone_number: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register(Extension(lazy_pool()?), Extension(auth_config()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_invalid_email() -> Result<()> {
        let mut request = request();
        request.email = "not-an-email".to_string();
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_short_username() -> Result<()> {
        let mut request = request();
        request.username = "a".to_string();
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_short_password() -> Result<()> {
        let mut request = request();
        request.password = "short".to_string();
        let response = register(
            Extension(lazy_pool()?),
            Extension(auth_config()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
