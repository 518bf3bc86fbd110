use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::source::AccountSource;
use crate::Archive;

/// Reloads the archive every `every`; a failed reload keeps the current set.
pub fn start_refresh_task<S>(archive: Arc<Archive<S>>, every: Duration) -> JoinHandle<()>
where
    S: AccountSource + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "refresh task started");
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; the caller has just loaded
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(error) = archive.reload().await {
                warn!(%error, "scheduled reload failed");
            }
        }
    })
}
