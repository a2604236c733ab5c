//! Cookie jar management

pub mod store;

pub use store::CookieStore;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Refresh the jar every `period` until the handle is aborted
///
/// The first tick fires after one full period; startup refresh is the
/// caller's job.
pub fn spawn_refresh_task(store: Arc<CookieStore>, period: Duration) -> JoinHandle<()> {
    info!("Refreshing cookies every {}s", period.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!("Periodic cookie refresh");
            store.refresh().await;
        }
    })
}
