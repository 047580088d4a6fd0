//! Auth configuration shared across handlers.

use secrecy::SecretString;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 360_000;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 3600;

/// Token signing and reset-flow settings, injected at process start.
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    session_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    frontend_base_url: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            jwt_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            frontend_base_url,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    pub(crate) fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("reset_token_ttl_seconds", &self.reset_token_ttl_seconds)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_configuration() {
        let config = AuthConfig::new(
            SecretString::from("secret"),
            "https://loocate.dev".to_string(),
        );
        assert_eq!(config.session_ttl_seconds(), 360_000);
        assert_eq!(config.reset_token_ttl_seconds(), 3600);
        assert_eq!(config.frontend_base_url(), "https://loocate.dev");
    }

    #[test]
    fn builders_override_ttls() {
        let config = AuthConfig::new(
            SecretString::from("secret"),
            "https://loocate.dev".to_string(),
        )
        .with_session_ttl_seconds(60)
        .with_reset_token_ttl_seconds(120);
        assert_eq!(config.session_ttl_seconds(), 60);
        assert_eq!(config.reset_token_ttl_seconds(), 120);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig::new(
            SecretString::from("super-secret"),
            "https://loocate.dev".to_string(),
        );
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }
}
