//! Flattening of hierarchical KV trees into a flat configuration snapshot.

use serde_json::Value as JsonValue;

/// Separator used for flattened configuration keys.
///
/// Consul keys use `/`; flattened keys are re-joined with `.` to match the
/// conventional hierarchical form of Rust configuration keys.
pub const KEY_SEPARATOR: &str = ".";

/// An immutable, ordered, flat view of one complete KV snapshot.
///
/// Keys are compared case-insensitively and are unique within a snapshot.
/// Readers always observe a whole snapshot: the provider publishes a new
/// `ConfigSnapshot` with a single atomic pointer swap and never mutates one
/// in place.
///
/// # Examples
///
/// ```rust,no_run
/// # use consul_watch_config::prelude::*;
/// # fn example(snapshot: &ConfigSnapshot) {
/// if let Some(port) = snapshot.get("server.port") {
///     println!("Port: {}", port);
/// }
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    entries: Vec<(String, String)>,
}

impl ConfigSnapshot {
    /// Create an empty snapshot.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Look up a value by its flattened key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Number of flattened entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot contains no entries. An empty snapshot is still
    /// a valid, successfully applied snapshot.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in the order the store returned them.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert an entry, replacing any existing entry whose key matches
    /// case-insensitively.
    pub(crate) fn insert(&mut self, key: String, value: String) {
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Merge one decoded KV node into this snapshot under `prefix`.
    ///
    /// Objects are flattened recursively; a bare scalar maps directly to
    /// `prefix` (this is how a scalar at the namespace root becomes the
    /// empty-string key); arrays contribute nothing.
    pub(crate) fn merge_node(&mut self, prefix: &str, node: &JsonValue) {
        match node {
            JsonValue::Object(_) => {
                let mut pairs = Vec::new();
                flatten(prefix, node, &mut pairs);
                for (key, value) in pairs {
                    self.insert(normalize_key(&key), value);
                }
            }
            JsonValue::Array(_) => {}
            scalar => self.insert(normalize_key(prefix), scalar_text(scalar)),
        }
    }
}

/// Depth-first flattening of an object node.
///
/// Properties are visited in the store's returned order. Nested objects
/// recurse; arrays are dropped (a documented limitation, not a fault);
/// scalars and nulls yield one `(key, text)` pair each. Non-object nodes
/// contribute nothing at this level; the caller maps them directly.
pub(crate) fn flatten(prefix: &str, node: &JsonValue, out: &mut Vec<(String, String)>) {
    let JsonValue::Object(properties) = node else {
        return;
    };

    for (name, value) in properties {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        match value {
            JsonValue::Object(_) => flatten(&key, value, out),
            JsonValue::Array(_) => {}
            scalar => out.push((key, scalar_text(scalar))),
        }
    }
}

/// Re-join a `/`-separated KV key with the snapshot separator, dropping
/// empty segments. The empty key (a scalar at the namespace root) stays
/// empty.
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Text form of a scalar JSON value: strings unquoted, numbers and booleans
/// as their JSON text, null as the empty string.
fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
