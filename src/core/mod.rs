//! Core provider types: the handle and its builder.

mod builder;
mod handle;

pub use builder::ConsulConfigBuilder;
pub use handle::ConsulConfig;
