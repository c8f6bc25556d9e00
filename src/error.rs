//! Error types for consul-watch-config.

/// Result type alias for consul-watch-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while constructing a provider or querying the store.
///
/// Every fault the crate produces is classified into exactly one of these
/// variants; there is deliberately no catch-all. The watch loop treats
/// [`ConfigError::Timeout`] as a benign long-poll expiry and everything else
/// as grounds for failing over to the next endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Construction was attempted with an empty endpoint list.
    #[error("at least one Consul endpoint address is required")]
    NoEndpoints,

    /// Construction was attempted without a watched KV path.
    #[error("a watched KV path is required")]
    MissingPath,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A network-level failure: connection refused, DNS, TLS, broken body.
    #[error("transport failure against {endpoint}: {source}")]
    Transport {
        /// The endpoint the request was issued against.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request was cancelled or exceeded its deadline. Expected and
    /// frequent under long-poll semantics.
    #[error("request against {endpoint} timed out")]
    Timeout {
        /// The endpoint the request was issued against.
        endpoint: String,
    },

    /// The store answered with a non-success HTTP status.
    #[error("{endpoint} answered HTTP {status}")]
    Status {
        /// The endpoint the request was issued against.
        endpoint: String,
        /// The status code returned by the store.
        status: reqwest::StatusCode,
    },

    /// A KV value could not be decoded (invalid base64, UTF-8 or JSON).
    /// The whole query is discarded; no partial snapshot is published.
    #[error("failed to decode value for key '{key}': {reason}")]
    Decode {
        /// The KV key (or watched path, for listing-level failures).
        key: String,
        /// What went wrong while decoding.
        reason: String,
    },
}

impl ConfigError {
    /// Whether this fault is an expected long-poll expiry rather than a real
    /// failure. The watch loop retries these immediately without rotating
    /// endpoints.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
