//! Ambient (group, layer) addressing.
//!
//! The façade remembers one group/layer pair and derives a fresh
//! fully-qualified identifier from it on every request. Nothing here
//! talks to the store.

use stratum_client::{GroupIdentifier, KeyIdentifier, ValueKind};

/// Maximum stored length, in bytes, of a group or layer name.
///
/// Longer inputs are truncated to at most `MAX_NAME_LEN - 1` bytes,
/// never rejected.
pub const MAX_NAME_LEN: usize = 256;

/// Truncate a name to the stored bound, backing off to a character
/// boundary so the result stays valid UTF-8.
fn truncate_name(name: &str) -> String {
    if name.len() < MAX_NAME_LEN {
        return name.to_string();
    }
    let mut end = MAX_NAME_LEN - 1;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// The remembered (group, layer) pair used by subsequent key
/// operations.
///
/// Initialized empty; mutated only by the group-switch operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AmbientAddress {
    group: String,
    layer: String,
}

impl AmbientAddress {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub(crate) fn set(&mut self, group: &str, layer: &str) {
        self.group = truncate_name(group);
        self.layer = truncate_name(layer);
    }

    /// A typed key identifier under the current address.
    pub(crate) fn key(&self, name: &str, kind: ValueKind) -> KeyIdentifier {
        KeyIdentifier::typed(&self.group, name, &self.layer, kind)
    }

    /// A notification-scoped key identifier under the current address.
    pub(crate) fn watch_key(&self, name: &str) -> KeyIdentifier {
        KeyIdentifier::watch(&self.group, name, &self.layer)
    }

    /// The current address as a group identifier.
    pub(crate) fn group_id(&self) -> GroupIdentifier {
        GroupIdentifier::new(&self.group, &self.layer)
    }
}
