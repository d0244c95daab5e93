//! Periodic cleanup of expired magic links and sessions.
//!
//! Expiry is enforced on every read, so the sweeper only reclaims storage.

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error};

use super::{error::AuthError, service::MagicLinkService, store::PurgeCounts};

pub fn spawn_sweeper(service: Arc<MagicLinkService>) -> tokio::task::JoinHandle<()> {
    let interval = service.config().sweep_interval();
    spawn_sweeper_every(service, interval)
}

fn spawn_sweeper_every(
    service: Arc<MagicLinkService>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = sweep_once(&service).await {
                error!("magic link sweep failed: {err}");
            }

            sleep(interval).await;
        }
    })
}

/// Run one sweep and log what was removed.
///
/// # Errors
/// Returns the store error; the caller decides whether to keep looping.
pub async fn sweep_once(service: &MagicLinkService) -> Result<PurgeCounts, AuthError> {
    let counts = service.purge_expired().await?;
    if counts != PurgeCounts::default() {
        debug!(
            magic_links = counts.magic_links,
            sessions = counts.sessions,
            "purged expired auth rows"
        );
    }
    Ok(counts)
}
