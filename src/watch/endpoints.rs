//! Endpoint addresses and round-robin failover selection.

use crate::error::{ConfigError, Result};
use std::fmt;

/// Base address of one store replica. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    /// Create an endpoint from a base address such as `http://consul-1:8500`.
    ///
    /// Trailing slashes are normalized away so URL assembly is uniform.
    pub fn new(address: impl Into<String>) -> Self {
        let mut base = address.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    /// The normalized base address.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// KV read URL for the given path on this endpoint.
    pub(crate) fn kv_url(&self, path: &str) -> String {
        format!("{}/v1/kv/{}", self.base, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Ordered, fixed pool of candidate endpoints with a round-robin cursor.
///
/// Failover never removes an endpoint; [`EndpointPool::advance`] only moves
/// the cursor, wrapping back to the first endpoint after the last.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: usize,
}

impl EndpointPool {
    /// Build a pool from an ordered endpoint list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoEndpoints`] for an empty list.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            cursor: 0,
        })
    }

    /// The currently selected endpoint.
    pub fn current(&self) -> &Endpoint {
        &self.endpoints[self.cursor]
    }

    /// Move the cursor to the next endpoint, wrapping modulo pool size.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.endpoints.len();
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; construction rejects empty pools.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
