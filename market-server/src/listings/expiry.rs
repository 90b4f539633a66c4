//! Expiry scheduler
//!
//! Periodic driver for [`CropLifecycleManager::poll_expired_once`]. Runs
//! until its cancellation token fires; a failed pass is logged and the next
//! tick proceeds normally.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::manager::CropLifecycleManager;

pub struct ExpiryScheduler {
    manager: CropLifecycleManager,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpiryScheduler {
    pub fn new(
        manager: CropLifecycleManager,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            interval,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(interval = ?self.interval, "Expiry scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of tokio's interval fires immediately; that first
        // pass doubles as a startup catch-up.

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry scheduler stopped");
                    return;
                }
                _ = ticker.tick() => {
                    match self.manager.poll_expired_once().await {
                        Ok(handled) => {
                            tracing::debug!(handled, "Expiry pass finished");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Expiry pass failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn scheduler_stops_on_cancellation() {
        let env = testutil::TestEnv::new().await;
        let token = CancellationToken::new();
        let scheduler = ExpiryScheduler::new(env.listings(), Duration::from_millis(20), token.clone());

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(60)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop after cancellation")
            .unwrap();
    }
}
