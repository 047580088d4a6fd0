use crate::api::{self, email, handlers::auth::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub frontend_base_url: String,
    pub smtp_url: Option<String>,
    pub mail_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the mail transport cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(
        SecretString::from(args.jwt_secret),
        args.frontend_base_url.clone(),
    )
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds);

    let sender: Arc<dyn email::EmailSender> = match &args.smtp_url {
        Some(url) => Arc::new(email::SmtpEmailSender::from_url(url, &args.mail_from)?),
        None => {
            warn!("No SMTP URL configured; outbound mail will be logged, not delivered");
            Arc::new(email::LogEmailSender)
        }
    };

    api::new(args.port, args.dsn, auth_config, sender).await
}
