//! Wire model for Consul KV listings and snapshot assembly.

use crate::error::{ConfigError, Result};
use crate::kv::flatten::ConfigSnapshot;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// One raw entry from a recursive KV listing.
///
/// The store returns a JSON array of these; `Value` carries the stored bytes
/// base64-encoded, or null for a tombstone. Fields the store adds beyond
/// these two are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct KvEntry {
    /// Full key, including the watched path prefix.
    #[serde(rename = "Key")]
    pub key: String,

    /// Base64-encoded value, or `None` for a tombstone.
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

impl KvEntry {
    /// Decode the stored value: base64 to UTF-8 to JSON.
    ///
    /// A missing or empty value is a tombstone and decodes to `None`. Any
    /// decode failure fails the whole query; partial snapshots are never
    /// assembled from a response that contains bad data.
    pub(crate) fn decode(&self) -> Result<Option<JsonValue>> {
        let Some(raw) = self.value.as_deref() else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let bytes = BASE64.decode(raw).map_err(|e| ConfigError::Decode {
            key: self.key.clone(),
            reason: format!("invalid base64: {e}"),
        })?;

        let text = String::from_utf8(bytes).map_err(|e| ConfigError::Decode {
            key: self.key.clone(),
            reason: format!("value is not UTF-8: {e}"),
        })?;

        let node = serde_json::from_str(&text).map_err(|e| ConfigError::Decode {
            key: self.key.clone(),
            reason: format!("value is not valid JSON: {e}"),
        })?;

        Ok(Some(node))
    }
}

/// Assemble one complete snapshot from a recursive KV listing.
///
/// A single-entry listing is the single-key case: its decoded value becomes
/// the root node under the empty key, whatever its key says. With multiple
/// entries each key is taken relative to the watched path; entries whose
/// relative key is empty or whitespace (the directory marker for the watched
/// path itself) are discarded. An empty listing yields an empty but valid
/// snapshot.
pub(crate) fn build_snapshot(path: &str, entries: Vec<KvEntry>) -> Result<ConfigSnapshot> {
    let mut snapshot = ConfigSnapshot::new();
    let mut entries = entries;

    if entries.len() == 1 {
        let entry = entries.remove(0);
        if let Some(node) = entry.decode()? {
            snapshot.merge_node("", &node);
        }
        return Ok(snapshot);
    }

    for entry in entries {
        let Some(relative) = relative_key(path, &entry.key) else {
            continue;
        };
        if let Some(node) = entry.decode()? {
            snapshot.merge_node(&relative, &node);
        }
    }

    Ok(snapshot)
}

/// Strip the watched path prefix from a listing key.
///
/// Returns `None` when nothing meaningful remains, which drops the entry.
fn relative_key(path: &str, key: &str) -> Option<String> {
    let stripped = key.strip_prefix(path).unwrap_or(key);
    let relative = stripped.trim_matches('/');
    if relative.trim().is_empty() {
        None
    } else {
        Some(relative.to_string())
    }
}
