use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_EMAIL_API_URL: &str = "email-api-url";
pub const ARG_EMAIL_API_KEY: &str = "email-api-key";
pub const ARG_EMAIL_FROM: &str = "email-from";

/// Transactional email settings. Without an API URL mail is only logged.
#[derive(Debug, Clone)]
pub struct Options {
    pub api_url: Option<String>,
    pub api_key: SecretString,
    pub from: String,
}

impl Options {
    /// Parse email arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an API URL is given without an API key.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let api_url = get_non_empty(ARG_EMAIL_API_URL);
        let api_key = get_non_empty(ARG_EMAIL_API_KEY);
        if api_url.is_some() && api_key.is_none() {
            anyhow::bail!("missing required argument: --{ARG_EMAIL_API_KEY}");
        }

        Ok(Self {
            api_url,
            api_key: SecretString::from(api_key.unwrap_or_default()),
            from: get_non_empty(ARG_EMAIL_FROM).unwrap_or_else(|| "noreply@boxport.dev".to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_API_URL)
                .long(ARG_EMAIL_API_URL)
                .help("Transactional email API endpoint; emails are only logged when unset")
                .env("BOXPORT_EMAIL_API_URL"),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("API key for the transactional email endpoint")
                .env("BOXPORT_EMAIL_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("Sender address for magic link emails")
                .env("BOXPORT_EMAIL_FROM")
                .default_value("noreply@boxport.dev"),
        )
}
