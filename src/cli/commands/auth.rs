use clap::{Arg, ArgMatches, Command};

use crate::magic_link::config::MAX_TTL_SECONDS;

pub const ARG_APP_BASE_URL: &str = "app-base-url";
pub const ARG_ADMIN_EMAILS: &str = "admin-emails";
pub const ARG_MAGIC_LINK_TTL_SECONDS: &str = "magic-link-ttl-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SWEEP_INTERVAL_SECONDS: &str = "sweep-interval-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub app_base_url: String,
    pub admin_emails: String,
    pub magic_link_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub sweep_interval_seconds: u64,
}

impl Options {
    /// Parse magic-link arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or TTLs are outside 1s..=1 year.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let read_required = |id: &str| -> anyhow::Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        let read_ttl = |id: &str| -> anyhow::Result<i64> {
            match matches.get_one::<i64>(id).copied() {
                Some(value) if (1..=MAX_TTL_SECONDS).contains(&value) => Ok(value),
                Some(value) => anyhow::bail!(
                    "--{id} must be between 1 and {MAX_TTL_SECONDS} seconds, got {value}"
                ),
                None => anyhow::bail!("missing required argument: --{id}"),
            }
        };

        let sweep_interval_seconds = matches
            .get_one::<u64>(ARG_SWEEP_INTERVAL_SECONDS)
            .copied()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                anyhow::anyhow!("--{ARG_SWEEP_INTERVAL_SECONDS} must be greater than zero")
            })?;

        Ok(Self {
            app_base_url: read_required(ARG_APP_BASE_URL)?,
            admin_emails: read_required(ARG_ADMIN_EMAILS)?,
            magic_link_ttl_seconds: read_ttl(ARG_MAGIC_LINK_TTL_SECONDS)?,
            session_ttl_seconds: read_ttl(ARG_SESSION_TTL_SECONDS)?,
            sweep_interval_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_APP_BASE_URL)
                .long(ARG_APP_BASE_URL)
                .help("Public base URL of the storefront, used in magic links and CORS")
                .env("BOXPORT_APP_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_ADMIN_EMAILS)
                .long(ARG_ADMIN_EMAILS)
                .help("Comma-separated emails allowed to request admin magic links")
                .env("BOXPORT_ADMIN_EMAILS")
                .required(true),
        )
        .arg(
            Arg::new(ARG_MAGIC_LINK_TTL_SECONDS)
                .long(ARG_MAGIC_LINK_TTL_SECONDS)
                .help("Magic link lifetime in seconds")
                .env("BOXPORT_MAGIC_LINK_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Admin session cookie TTL in seconds")
                .env("BOXPORT_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SWEEP_INTERVAL_SECONDS)
                .long(ARG_SWEEP_INTERVAL_SECONDS)
                .help("Interval between expired token sweeps in seconds")
                .env("BOXPORT_SWEEP_INTERVAL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64)),
        )
}
