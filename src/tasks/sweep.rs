//! Cache Sweep Task
//!
//! Background task that periodically removes expired response-cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::CfbdClient;

/// Spawns a background task that periodically sweeps expired entries out of
/// the client's response cache.
///
/// Expired entries are also dropped lazily on read, so the sweeper only
/// reclaims memory for keys nobody asks for again.
///
/// # Arguments
/// * `client` - Shared client whose cache is swept
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_sweeper_task(client: Arc<CfbdClient>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache sweeper task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = client.sweep_expired().await;
            if removed > 0 {
                info!("Swept {} expired cache entries", removed);
            } else {
                debug!("Cache sweep found no expired entries");
            }
        }
    })
}
