//! # consul-watch-config
//!
//! Live configuration from Consul KV with long-poll watches, endpoint
//! failover and atomic hot-swapped snapshots.
//!
//! ## Overview
//!
//! `consul-watch-config` keeps an in-memory configuration snapshot
//! continuously synchronized with a hierarchical KV prefix in Consul:
//! - Blocking (long-poll) queries driven by Consul's change index, so
//!   changes are picked up with minimal latency and no busy-waiting
//! - Round-robin failover across a fixed pool of endpoints, with a
//!   cooldown after a full failed sweep
//! - A deterministic flattener that turns the KV tree into a flat,
//!   case-insensitive key/value snapshot published with a single atomic
//!   pointer swap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use consul_watch_config::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! // The initial load is synchronous; faults here abort startup.
//! let config = ConsulConfig::builder()
//!     .with_endpoint("http://consul-1:8500")
//!     .with_endpoint("http://consul-2:8500")
//!     .with_path("myapp/config")
//!     .build()
//!     .await?;
//!
//! // Lock-free reads of the live snapshot
//! let snapshot = config.snapshot();
//! println!("Port: {:?}", snapshot.get("server.port"));
//!
//! // React to changes applied by the background watch
//! let _subscription = config.subscribe(|snapshot| {
//!     println!("configuration refreshed, {} keys", snapshot.len());
//! }).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Behavior
//!
//! - **Read-only client**: only KV reads under one watched prefix; no
//!   writes, transactions, sessions or ACL management
//! - **Atomic snapshots**: readers never observe a partially-built or
//!   mixed snapshot; publication is a whole-map replace
//! - **Stale-but-available**: while every endpoint is down, the last
//!   applied snapshot stays in effect and the loop keeps sweeping with a
//!   one-minute cooldown between sweeps
//! - **Arrays are dropped** during flattening, a documented limitation of
//!   the KV-to-configuration mapping
//!
//! Background-loop faults never crash the process; they are classified,
//! logged via `tracing` and retried.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod kv;
pub mod notify;
pub mod watch;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConsulConfig, ConsulConfigBuilder};
    pub use crate::error::{ConfigError, Result};
    pub use crate::kv::ConfigSnapshot;
    pub use crate::notify::SubscriptionHandle;
}
