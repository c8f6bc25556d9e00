//! Subscriber-based notifications for applied configuration snapshots.

use crate::kv::ConfigSnapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

type ChangeCallback = Box<dyn Fn(Arc<ConfigSnapshot>) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is automatically removed.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let id = self.id;
        let registry = Arc::clone(&self.registry);
        // Removal needs the async lock; skip it when no runtime is left,
        // the registry is being torn down with the process anyway.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let mut inner = registry.write().await;
                inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
            });
        }
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, ChangeCallback)>,
    next_id: usize,
}

/// Registry of callbacks invoked once per successfully applied snapshot.
///
/// The watch loop calls [`SubscriberRegistry::notify_all`] exactly once after
/// each successful background query; the initial load never notifies.
///
/// # Examples
///
/// ```rust,no_run
/// use consul_watch_config::notify::SubscriberRegistry;
///
/// # async fn example(snapshot: std::sync::Arc<consul_watch_config::kv::ConfigSnapshot>) {
/// let registry = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|snapshot| {
///     println!("{} keys live", snapshot.len());
/// }).await;
///
/// registry.notify_all(snapshot).await;
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// # }
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to applied snapshots.
    ///
    /// The callback receives the freshly published snapshot. Returns a handle
    /// that can be dropped to unsubscribe.
    pub async fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Arc<ConfigSnapshot>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Invoke every subscriber with the given snapshot, in subscription order.
    pub async fn notify_all(&self, snapshot: Arc<ConfigSnapshot>) {
        let inner = self.inner.read().await;
        for (_id, callback) in &inner.subscribers {
            callback(Arc::clone(&snapshot));
        }
    }

    /// Number of active subscribers.
    pub async fn subscriber_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
