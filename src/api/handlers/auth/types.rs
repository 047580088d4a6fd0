//! Request/response types for account and auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub phone_number: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetQuery {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdatePasswordRequest {
    pub email: String,
    pub password: String,
}

/// Account as returned to its owner; the password hash never leaves the store.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: String,
}

/// Plain confirmation body for operations without a richer payload.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Error body carried by every non-2xx response: a list of messages,
/// optionally tied to the offending field.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorMessage>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorMessage {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl ErrorResponse {
    pub(crate) fn single(msg: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorMessage {
                msg: msg.into(),
                param: None,
            }],
        }
    }

    pub(crate) fn field(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorMessage {
                msg: msg.into(),
                param: Some(param.into()),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            email: "alice@example.com".to_string(),
            password: "hunter2!".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: LoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "hunter2!");
        Ok(())
    }

    #[test]
    fn error_response_shape() -> Result<()> {
        let body = ErrorResponse::single("Invalid credentials");
        let value = serde_json::to_value(&body)?;
        assert_eq!(
            value,
            serde_json::json!({"errors": [{"msg": "Invalid credentials"}]})
        );
        Ok(())
    }

    #[test]
    fn field_error_carries_param() -> Result<()> {
        let body = ErrorResponse::field("email", "Please include a valid email");
        let value = serde_json::to_value(&body)?;
        assert_eq!(
            value,
            serde_json::json!({
                "errors": [{"msg": "Please include a valid email", "param": "email"}]
            })
        );
        Ok(())
    }

    #[test]
    fn register_request_optional_fields() -> Result<()> {
        let decoded: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "bob@example.com",
            "username": "bob",
            "password": "secret1",
        }))?;
        assert!(decoded.phone_number.is_none());
        assert!(decoded.avatar_url.is_none());
        Ok(())
    }
}
