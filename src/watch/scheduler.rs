//! The background watch loop: blocking queries, failover and backoff.

use crate::kv::ConfigSnapshot;
use crate::notify::SubscriberRegistry;
use crate::watch::query::QueryExecutor;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Cooldown applied after every endpoint in the pool has failed in a row.
pub(crate) const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Drives an unbounded sequence of blocking queries and publishes each
/// successful snapshot atomically.
///
/// The loop owns the executor outright, so exactly one query is in flight at
/// any time and the endpoint cursor, failure counter and change index have a
/// single writer. Faults never escape the loop; they are classified, logged
/// and retried. The loop exits when the shutdown channel fires or every
/// provider handle has been dropped.
pub(crate) struct WatchLoop {
    executor: QueryExecutor,
    current: Arc<ArcSwap<ConfigSnapshot>>,
    subscribers: Arc<SubscriberRegistry>,
    cooldown: Duration,
    shutdown: watch::Receiver<bool>,
}

impl WatchLoop {
    pub fn new(
        executor: QueryExecutor,
        current: Arc<ArcSwap<ConfigSnapshot>>,
        subscribers: Arc<SubscriberRegistry>,
        cooldown: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            executor,
            current,
            subscribers,
            cooldown,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut failures: usize = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            // A full sweep of the pool has failed: back off before sweeping
            // again. The last applied snapshot stays in effect meanwhile.
            if failures >= self.executor.endpoint_count() {
                warn!(
                    failures,
                    cooldown_secs = self.cooldown.as_secs(),
                    "all endpoints failed, backing off"
                );
                failures = 0;
                tokio::select! {
                    _ = sleep(self.cooldown) => {}
                    _ = self.shutdown.changed() => break,
                }
            }

            tokio::select! {
                outcome = self.executor.execute(true) => match outcome {
                    Ok(snapshot) => {
                        debug!(
                            keys = snapshot.len(),
                            index = ?self.executor.last_index(),
                            "applying configuration snapshot"
                        );
                        let snapshot = Arc::new(snapshot);
                        self.current.store(Arc::clone(&snapshot));
                        self.subscribers.notify_all(snapshot).await;
                        failures = 0;
                    }
                    Err(err) if err.is_timeout() => {
                        // Long-poll expiries are the normal idle rhythm.
                        trace!("blocking query expired without changes");
                        failures = 0;
                    }
                    Err(err) => {
                        warn!(
                            error = %err,
                            endpoint = %self.executor.current_endpoint(),
                            "query failed, rotating to next endpoint"
                        );
                        self.executor.fail_over();
                        failures += 1;
                    }
                },
                _ = self.shutdown.changed() => break,
            }
        }

        debug!("configuration watch stopped");
    }
}
