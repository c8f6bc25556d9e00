//! KV wire model, value decoding and tree flattening.

mod entry;
mod flatten;

pub use entry::KvEntry;
pub use flatten::{ConfigSnapshot, KEY_SEPARATOR};

pub(crate) use entry::build_snapshot;
