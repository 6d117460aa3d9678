//! Fully-qualified store identifiers.
//!
//! A store addresses data as (group, key name, layer). The façade
//! derives these from its ambient state per call; nothing at this
//! layer remembers them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// A fully-qualified key address.
///
/// `kind` is the value kind the caller intends to read or write.
/// Notification-scoped keys carry no kind: a subscription fires for
/// whatever kind the key ends up holding.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyIdentifier {
    pub group: String,
    pub name: String,
    pub layer: String,
    pub kind: Option<ValueKind>,
}

impl KeyIdentifier {
    /// A key address for a typed set or get.
    pub fn typed(
        group: impl Into<String>,
        name: impl Into<String>,
        layer: impl Into<String>,
        kind: ValueKind,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            layer: layer.into(),
            kind: Some(kind),
        }
    }

    /// A notification-scoped key address (no kind).
    pub fn watch(
        group: impl Into<String>,
        name: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            layer: layer.into(),
            kind: None,
        }
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.layer, self.group, self.name)
    }
}

/// A group address, used for group lifecycle operations.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupIdentifier {
    pub group: String,
    pub layer: String,
}

impl GroupIdentifier {
    pub fn new(group: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            layer: layer.into(),
        }
    }
}

impl fmt::Display for GroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layer, self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_key_carries_kind() {
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int32);
        assert_eq!(key.kind, Some(ValueKind::Int32));
        assert_eq!(key.group, "g");
        assert_eq!(key.name, "k");
        assert_eq!(key.layer, "user");
    }

    #[test]
    fn watch_key_has_no_kind() {
        let key = KeyIdentifier::watch("g", "k", "user");
        assert_eq!(key.kind, None);
    }

    #[test]
    fn display_formats() {
        let key = KeyIdentifier::typed("settings", "brightness", "user", ValueKind::Int32);
        assert_eq!(key.to_string(), "user:settings/brightness");

        let group = GroupIdentifier::new("settings", "user");
        assert_eq!(group.to_string(), "user:settings");
    }
}
