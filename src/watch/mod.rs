//! Endpoint failover, query execution and the long-poll watch loop.

mod endpoints;
mod query;
mod scheduler;

pub use endpoints::{Endpoint, EndpointPool};

pub(crate) use query::{HttpFetcher, QueryExecutor};
pub(crate) use scheduler::{DEFAULT_COOLDOWN, WatchLoop};
