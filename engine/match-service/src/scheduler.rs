use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::aggregator::{MatchAggregator, RefreshOutcome};

/// Periodic background refresh of the match cache
pub struct RefreshScheduler {
    aggregator: Arc<MatchAggregator>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(aggregator: Arc<MatchAggregator>, period: Duration) -> Self {
        Self { aggregator, period }
    }

    /// Start the refresh loop; it stops once `shutdown` flips to true.
    ///
    /// The first refresh happens one full period after the call.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Starting match refresh scheduler (every {:?})", self.period);

            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.aggregator.refresh().await {
                            RefreshOutcome::Updated { count } => {
                                info!("Scheduled refresh completed: {} matches", count);
                            }
                            RefreshOutcome::Failed { error } => {
                                error!("Scheduled refresh failed: {}", error);
                            }
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Match refresh scheduler stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
