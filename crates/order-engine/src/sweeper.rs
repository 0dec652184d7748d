//! Expired-order removal.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::periodic::PeriodicJob;
use crate::ports::OrderStore;
use crate::unix_now;

/// Deletes every order expiring within `grace_secs` of now, in one predicate
/// delete per tick.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn OrderStore>,
    grace_secs: u64,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn OrderStore>, grace_secs: u64) -> Self {
        Self { store, grace_secs }
    }

    /// Sweep as of `now`; returns the number of deleted orders.
    pub async fn sweep_at(&self, now: u64) -> Result<u64> {
        let cutoff = now.saturating_add(self.grace_secs);
        let deleted = self.store.delete_expired(cutoff).await?;
        if deleted > 0 {
            info!(deleted, cutoff, "Swept expired orders");
        } else {
            debug!(cutoff, "No expired orders");
        }
        Ok(deleted)
    }
}

#[async_trait]
impl PeriodicJob for ExpirySweeper {
    fn name(&self) -> &'static str {
        "expiry_sweeper"
    }

    async fn tick(&self) -> Result<()> {
        self.sweep_at(unix_now()).await.map(|_| ())
    }
}
