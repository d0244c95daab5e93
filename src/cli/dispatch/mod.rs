//! Maps validated CLI matches to the action the binary executes.

use crate::cli::actions::{Action, server::Args};
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
        app_base_url: auth_opts.app_base_url,
        admin_emails: auth_opts.admin_emails,
        magic_link_ttl_seconds: auth_opts.magic_link_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        sweep_interval_seconds: auth_opts.sweep_interval_seconds,
        email_api_url: email_opts.api_url,
        email_api_key: email_opts.api_key,
        email_from: email_opts.from,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_server_action_from_env() {
        temp_env::with_vars(
            [
                ("BOXPORT_DSN", Some("postgres://user@localhost:5432/boxport")),
                ("BOXPORT_ADMIN_EMAILS", Some("admin@boxport.dev")),
                ("BOXPORT_PORT", Some("9090")),
                ("BOXPORT_EMAIL_API_URL", None),
                ("BOXPORT_EMAIL_API_KEY", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["boxport"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 9090);
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/boxport");
                    assert_eq!(args.admin_emails, "admin@boxport.dev");
                    assert!(args.email_api_url.is_none());
                }
            },
        );
    }

    #[test]
    fn email_api_url_without_key_is_rejected() {
        temp_env::with_vars(
            [
                ("BOXPORT_DSN", Some("postgres://user@localhost:5432/boxport")),
                ("BOXPORT_ADMIN_EMAILS", Some("admin@boxport.dev")),
                (
                    "BOXPORT_EMAIL_API_URL",
                    Some("https://api.mail.test/v3/smtp/email"),
                ),
                ("BOXPORT_EMAIL_API_KEY", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["boxport"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(
                        err.to_string()
                            .contains("missing required argument: --email-api-key")
                    );
                }
            },
        );
    }
}
