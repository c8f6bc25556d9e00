//! The provider handle giving lock-free access to the live snapshot.

use crate::core::ConsulConfigBuilder;
use crate::kv::ConfigSnapshot;
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::watch;

/// Handle to a running Consul-backed configuration provider.
///
/// Constructed through [`ConsulConfig::builder`], which performs the initial
/// synchronous load (surfacing any fault to the caller) and then launches one
/// background task that keeps the snapshot fresh via long-poll watches.
///
/// Reads are lock-free: [`ConsulConfig::snapshot`] is a single atomic pointer
/// load, and the snapshot it returns is always the complete result of one
/// successfully decoded query, never a blend of two.
///
/// # Examples
///
/// ```rust,no_run
/// use consul_watch_config::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let config = ConsulConfig::builder()
///     .with_endpoint("http://consul-1:8500")
///     .with_endpoint("http://consul-2:8500")
///     .with_path("myapp/config")
///     .build()
///     .await?;
///
/// if let Some(port) = config.get("server.port") {
///     println!("Port: {}", port);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsulConfig {
    pub(crate) current: Arc<ArcSwap<ConfigSnapshot>>,
    pub(crate) subscribers: Arc<SubscriberRegistry>,
    pub(crate) shutdown: watch::Sender<bool>,
}

impl ConsulConfig {
    /// Create a new builder for constructing a provider.
    pub fn builder() -> ConsulConfigBuilder {
        ConsulConfigBuilder::new()
    }

    /// Get a reference-counted handle to the current snapshot.
    ///
    /// This is a lock-free pointer load; readers never block the watch loop
    /// and the returned snapshot never changes underneath them.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Look up a single value by its flattened key, case-insensitively.
    ///
    /// Convenience over [`ConsulConfig::snapshot`] for one-off reads; take a
    /// snapshot instead when several related keys must come from the same
    /// version.
    pub fn get(&self, key: &str) -> Option<String> {
        self.snapshot().get(key).map(str::to_owned)
    }

    /// Subscribe to snapshot changes.
    ///
    /// The callback is invoked exactly once per snapshot the background loop
    /// applies. It does not fire for the initial load. Drop the returned
    /// handle to unsubscribe.
    pub async fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Arc<ConfigSnapshot>) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback).await
    }

    /// Stop the background watch loop.
    ///
    /// The last applied snapshot stays readable. Idempotent; the loop also
    /// stops on its own when every handle has been dropped.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether the background watch loop is still running.
    pub fn is_watching(&self) -> bool {
        self.shutdown.receiver_count() > 0 && !*self.shutdown.borrow()
    }
}
