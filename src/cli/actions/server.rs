use crate::{
    api, db,
    email::{EmailSender, HttpEmailSender, LogEmailSender},
    magic_link::{AdminAllowList, MagicLinkConfig, MagicLinkService, PgAuthStore, SystemClock},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub app_base_url: String,
    pub admin_emails: String,
    pub magic_link_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub sweep_interval_seconds: u64,
    pub email_api_url: Option<String>,
    pub email_api_key: SecretString,
    pub email_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid, the database is unreachable,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let allow_list =
        AdminAllowList::parse(&args.admin_emails).context("Invalid admin email allow-list")?;
    info!(admins = allow_list.len(), "admin allow-list loaded");
    let mailer = mailer(&args)?;
    let config = magic_link_config(&args);

    let pool = db::connect(&args.dsn).await?;
    let store = Arc::new(PgAuthStore::new(pool.clone()));

    let service = MagicLinkService::new(config, allow_list, store, mailer, Arc::new(SystemClock));

    api::new(args.port, pool, Arc::new(service)).await
}

fn magic_link_config(args: &Args) -> MagicLinkConfig {
    MagicLinkConfig::new(args.app_base_url.clone())
        .with_token_ttl_seconds(args.magic_link_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_sweep_interval_seconds(args.sweep_interval_seconds)
}

fn mailer(args: &Args) -> Result<Arc<dyn EmailSender>> {
    match &args.email_api_url {
        Some(url) => Ok(Arc::new(HttpEmailSender::new(
            url,
            args.email_api_key.clone(),
            args.email_from.clone(),
        )?)),
        None => {
            warn!("No email API configured; magic links will only be logged");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

fn log_startup_args(args: &Args) {
    let mailer = if args.email_api_url.is_some() {
        "HTTP"
    } else {
        "LOG"
    };
    info!(
        port = args.port,
        app_base_url = %args.app_base_url,
        magic_link_ttl_seconds = args.magic_link_ttl_seconds,
        session_ttl_seconds = args.session_ttl_seconds,
        sweep_interval_seconds = args.sweep_interval_seconds,
        mailer,
        "Starting boxport"
    );
}
