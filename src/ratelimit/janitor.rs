//! Background reclamation of stale limiter state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::limiter::RateLimiter;

/// Default sweep interval, independent of any configured window size. A
/// missed sweep only delays memory reclamation.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// A long-lived background task that periodically sweeps the limiter's usage
/// map to bound memory.
///
/// The janitor shares the limiter's lock domain but never holds a lock across
/// an await point; each tick runs [`RateLimiter::cleanup`], which itself holds
/// the write lock only per delete batch.
pub struct Janitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the janitor with the default sweep interval.
    pub fn spawn(limiter: Arc<RateLimiter>) -> Self {
        Self::spawn_with_interval(limiter, DEFAULT_SWEEP_INTERVAL)
    }

    /// Spawn the janitor with a custom sweep interval.
    pub fn spawn_with_interval(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh janitor
            // does not sweep before any traffic has arrived.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = limiter.cleanup();
                        if evicted > 0 {
                            debug!(evicted = evicted, "Janitor sweep complete");
                        }
                    }
                    _ = signal.changed() => {
                        info!("Janitor shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Signal the janitor to stop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::spec::{RateLimitSpec, ResourceKind};

    #[tokio::test]
    async fn test_janitor_sweeps_stale_state() {
        let limiter = Arc::new(RateLimiter::with_retention_grace(Duration::ZERO));
        limiter
            .add_limit(
                "api:requests",
                RateLimitSpec::new(ResourceKind::Requests, 5, Duration::from_millis(10)),
            )
            .unwrap();
        limiter.check("api:requests", 1).unwrap();

        let janitor = Janitor::spawn_with_interval(Arc::clone(&limiter), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(limiter.get_usage("api:requests").is_none());

        janitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_janitor_shutdown_is_clean() {
        let limiter = Arc::new(RateLimiter::new());
        let janitor = Janitor::spawn(Arc::clone(&limiter));
        janitor.shutdown().await;
    }
}
