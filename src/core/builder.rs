//! Builder for constructing and starting a provider.

use crate::core::ConsulConfig;
use crate::error::{ConfigError, Result};
use crate::notify::SubscriberRegistry;
use crate::watch::{DEFAULT_COOLDOWN, Endpoint, EndpointPool, HttpFetcher, QueryExecutor, WatchLoop};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Builder for a [`ConsulConfig`] provider.
///
/// Endpoints are tried in the order given; the watched path is the KV prefix
/// observed for the provider's whole lifetime.
///
/// # Examples
///
/// ```rust,no_run
/// use consul_watch_config::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let config = ConsulConfig::builder()
///     .with_endpoints(["http://consul-1:8500", "http://consul-2:8500"])
///     .with_path("myapp/config")
///     .with_timeout(Duration::from_secs(90))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ConsulConfigBuilder {
    endpoints: Vec<Endpoint>,
    path: Option<String>,
    timeout: Option<Duration>,
    cooldown: Duration,
}

impl ConsulConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            path: None,
            timeout: None,
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Add one endpoint base address, e.g. `http://consul-1:8500`.
    pub fn with_endpoint(mut self, address: impl Into<String>) -> Self {
        self.endpoints.push(Endpoint::new(address));
        self
    }

    /// Add several endpoint base addresses, preserving their order.
    pub fn with_endpoints<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for address in addresses {
            self.endpoints.push(Endpoint::new(address));
        }
        self
    }

    /// Set the KV path prefix to watch. Required.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into().trim_matches('/').to_string());
        self
    }

    /// Set a per-request timeout on the HTTP client.
    ///
    /// By default requests have no client-side deadline and blocking reads
    /// stay open for as long as the store holds them. With a timeout set,
    /// expiries surface as benign timeout faults that restart the long-poll
    /// immediately.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the cooldown applied after a full failed sweep of all endpoints.
    ///
    /// Default is one minute.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Validate the configuration, perform the initial load and start the
    /// background watch.
    ///
    /// The initial load is a plain (non-blocking) read; any fault it hits
    /// propagates to the caller and nothing is started. On success the first
    /// snapshot is published without notifying subscribers and the long-poll
    /// loop is spawned exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint was provided ([`ConfigError::NoEndpoints`])
    /// - No watched path was provided ([`ConfigError::MissingPath`])
    /// - The HTTP client cannot be constructed
    /// - The initial query faults (transport, status, timeout or decode)
    pub async fn build(self) -> Result<ConsulConfig> {
        let path = self.path.ok_or(ConfigError::MissingPath)?;
        let pool = EndpointPool::new(self.endpoints)?;
        let fetcher = HttpFetcher::new(self.timeout)?;
        let mut executor = QueryExecutor::new(Box::new(fetcher), pool, path);

        let initial = executor.execute(false).await?;
        debug!(
            keys = initial.len(),
            index = ?executor.last_index(),
            "initial configuration loaded"
        );

        let current = Arc::new(ArcSwap::new(Arc::new(initial)));
        let subscribers = Arc::new(SubscriberRegistry::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let watch_loop = WatchLoop::new(
            executor,
            Arc::clone(&current),
            Arc::clone(&subscribers),
            self.cooldown,
            shutdown_rx,
        );
        tokio::spawn(watch_loop.run());

        Ok(ConsulConfig {
            current,
            subscribers,
            shutdown: shutdown_tx,
        })
    }
}

impl Default for ConsulConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_path_fails_fast() {
        let result = ConsulConfig::builder()
            .with_endpoint("http://localhost:8500")
            .build()
            .await;
        assert!(matches!(result, Err(ConfigError::MissingPath)));
    }

    #[tokio::test]
    async fn empty_endpoint_list_fails_fast() {
        let result = ConsulConfig::builder().with_path("app").build().await;
        assert!(matches!(result, Err(ConfigError::NoEndpoints)));
    }

    #[test]
    fn path_is_trimmed() {
        let builder = ConsulConfig::builder().with_path("/app/config/");
        assert_eq!(builder.path.as_deref(), Some("app/config"));
    }

    #[test]
    fn endpoints_preserve_order() {
        let builder = ConsulConfig::builder()
            .with_endpoints(["http://a:8500", "http://b:8500"])
            .with_endpoint("http://c:8500");
        let addresses: Vec<_> = builder.endpoints.iter().map(Endpoint::as_str).collect();
        assert_eq!(addresses, vec!["http://a:8500", "http://b:8500", "http://c:8500"]);
    }
}
