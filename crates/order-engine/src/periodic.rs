//! Cancellable periodic jobs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;

/// A job run on a fixed interval. A failed tick is logged and the next tick
/// still runs.
#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn tick(&self) -> Result<()>;
}

/// Run `job` every `period` until `shutdown` flips to `true` or its sender is
/// dropped. The first tick fires immediately.
pub fn spawn_periodic<J: PeriodicJob>(
    job: Arc<J>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(job = job.name(), period_ms = period.as_millis() as u64, "Job started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = job.tick().await {
                        warn!(job = job.name(), error = %e, "Job tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!(job = job.name(), "Job stopped");
    })
}
