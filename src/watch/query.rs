//! Query execution against the store's KV read API.

use crate::error::{ConfigError, Result};
use crate::kv::{ConfigSnapshot, KvEntry, build_snapshot};
use crate::watch::endpoints::{Endpoint, EndpointPool};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// Response header carrying the store's current change index.
const CHANGE_INDEX_HEADER: &str = "X-Consul-Index";

/// Last observed change index for the watched path. Starts unset.
///
/// The index is overwritten with whatever the store reports, including values
/// lower than previously seen: a store restart resets the counter and the
/// client adopts the new baseline rather than rejecting it.
#[derive(Debug, Default)]
pub(crate) struct ChangeIndex {
    last: Option<u64>,
}

impl ChangeIndex {
    pub fn get(&self) -> Option<u64> {
        self.last
    }

    pub fn record(&mut self, index: u64) {
        self.last = Some(index);
    }
}

/// One parsed KV read response: the new change index (if the store sent one)
/// and the raw listing entries.
#[derive(Debug)]
pub(crate) struct KvResponse {
    pub index: Option<u64>,
    pub entries: Vec<KvEntry>,
}

/// Seam between the query executor and the transport.
///
/// `index` is `Some` only for blocking reads; the store then holds the
/// request open until a change lands past that index or its own long-poll
/// timeout elapses.
#[async_trait]
pub(crate) trait KvFetch: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        path: &str,
        index: Option<u64>,
    ) -> Result<KvResponse>;
}

/// HTTP transport backed by a shared reqwest client.
pub(crate) struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the transport. Without a timeout the client waits as long as
    /// the store holds a long-poll open; with one, expiries surface as
    /// benign [`ConfigError::Timeout`] faults and the loop retries.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ConfigError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KvFetch for HttpFetcher {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        path: &str,
        index: Option<u64>,
    ) -> Result<KvResponse> {
        let mut request = self
            .client
            .get(endpoint.kv_url(path))
            .query(&[("recurse", "true")]);
        if let Some(index) = index {
            request = request.query(&[("index", index.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        // A header that is absent or malformed leaves the tracker untouched.
        let index = response
            .headers()
            .get(CHANGE_INDEX_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let body = response.text().await.map_err(|e| classify(endpoint, e))?;
        let entries = serde_json::from_str(&body).map_err(|e| ConfigError::Decode {
            key: path.to_string(),
            reason: format!("invalid KV listing: {e}"),
        })?;

        Ok(KvResponse { index, entries })
    }
}

fn classify(endpoint: &Endpoint, err: reqwest::Error) -> ConfigError {
    if err.is_timeout() {
        ConfigError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        ConfigError::Transport {
            endpoint: endpoint.to_string(),
            source: err,
        }
    }
}

/// Issues one KV read at a time against the currently selected endpoint and
/// turns the response into a complete flattened snapshot.
///
/// Owns the endpoint pool and the change index tracker; the watch loop is the
/// only caller, so both are plain single-writer state.
pub(crate) struct QueryExecutor {
    fetcher: Box<dyn KvFetch>,
    pool: EndpointPool,
    path: String,
    index: ChangeIndex,
}

impl QueryExecutor {
    pub fn new(fetcher: Box<dyn KvFetch>, pool: EndpointPool, path: String) -> Self {
        Self {
            fetcher,
            pool,
            path,
            index: ChangeIndex::default(),
        }
    }

    /// Run one query. A blocking query passes the last known change index so
    /// the store can long-poll; with the tracker unset it degenerates to an
    /// immediate read. Faults leave the change index untouched.
    pub async fn execute(&mut self, blocking: bool) -> Result<ConfigSnapshot> {
        let index = if blocking { self.index.get() } else { None };
        let endpoint = self.pool.current().clone();
        trace!(endpoint = %endpoint, path = %self.path, ?index, "issuing KV read");

        let response = self.fetcher.fetch(&endpoint, &self.path, index).await?;
        if let Some(observed) = response.index {
            self.index.record(observed);
        }

        build_snapshot(&self.path, response.entries)
    }

    /// Rotate to the next endpoint after a non-timeout fault.
    pub fn fail_over(&mut self) {
        self.pool.advance();
    }

    pub fn endpoint_count(&self) -> usize {
        self.pool.len()
    }

    pub fn current_endpoint(&self) -> &Endpoint {
        self.pool.current()
    }

    pub fn last_index(&self) -> Option<u64> {
        self.index.get()
    }
}
