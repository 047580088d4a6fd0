//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        reset_token_ttl_seconds: auth_opts.reset_token_ttl_seconds,
        frontend_base_url: auth_opts.frontend_base_url,
        smtp_url: email_opts.smtp_url,
        mail_from: email_opts.mail_from,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn server_action_from_env() {
        temp_env::with_vars(
            [
                ("LOOCATE_DSN", Some("postgres://user@localhost:5432/loocate")),
                ("LOOCATE_JWT_SECRET", Some("env-secret")),
                ("LOOCATE_PORT", Some("9090")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["loocate"]);
                let action = handler(&matches).expect("server action");
                let Action::Server(args) = action;
                assert_eq!(args.port, 9090);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/loocate");
                assert_eq!(args.jwt_secret, "env-secret");
                assert_eq!(args.session_ttl_seconds, 360_000);
                assert_eq!(args.reset_token_ttl_seconds, 3600);
                assert!(args.smtp_url.is_none());
            },
        );
    }
}
