//! Configuration Attributes
//!
//! Per-group edit attributes carried alongside a configuration document.
//! Each activation/synchronization group declared in the schema owns exactly
//! one [`FieldAttributes`] entry, keyed by the group's wire-form path. The
//! map travels as the `adcmMeta` member of config payloads.

use crate::models::path::FieldPath;
use crate::models::schema::SchemaNode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attributes of one activation/synchronization group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAttributes {
    /// `false` means the subtree's values are not applied (disabled), though
    /// the underlying data is kept
    pub is_active: bool,
    /// `false` on a host-group document marks the subtree as locally
    /// overridden rather than inherited from the parent configuration
    pub is_synchronized: bool,
}

impl Default for FieldAttributes {
    fn default() -> Self {
        Self {
            is_active: true,
            is_synchronized: true,
        }
    }
}

/// Group-path-keyed attribute map for one configuration document
///
/// Invariant: the key set is exactly the set of group paths whose schema
/// metadata declares non-null `activation` or `synchronization`. The map is
/// derived from the schema and then merged with saved values; consumers can
/// flip entries but never add or remove them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationAttributes {
    entries: IndexMap<String, FieldAttributes>,
}

impl ConfigurationAttributes {
    /// Derive the attribute map for a schema: one defaulted entry per
    /// declared group, in declared order.
    pub fn from_schema(schema: &SchemaNode) -> Self {
        let entries = schema
            .group_paths()
            .into_iter()
            .map(|path| (path.to_api_string(), FieldAttributes::default()))
            .collect();
        Self { entries }
    }

    /// Adopt saved attribute values for keys this map already declares.
    ///
    /// Keys present only in `saved` are ignored and keys missing from
    /// `saved` keep their defaults, so the declared-groups invariant holds
    /// even when a saved revision predates a schema change.
    pub fn merge_saved(&mut self, saved: &ConfigurationAttributes) {
        for (key, value) in &saved.entries {
            if let Some(slot) = self.entries.get_mut(key) {
                *slot = *value;
            }
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldAttributes> {
        self.entries.get(&path.to_api_string())
    }

    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut FieldAttributes> {
        self.entries.get_mut(&path.to_api_string())
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.entries.contains_key(&path.to_api_string())
    }

    /// Iterate entries in declared group order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldAttributes)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grouped_schema() -> SchemaNode {
        SchemaNode::parse(json!({
            "type": "object",
            "properties": {
                "core": {
                    "type": "object",
                    "adcmMeta": {"activation": {"isShown": false, "isAllowChange": true}},
                    "properties": {"workers": {"type": "integer"}}
                },
                "audit": {
                    "type": "object",
                    "adcmMeta": {"synchronization": {"isShown": true, "isAllowChange": false}},
                    "properties": {"enabled": {"type": "boolean"}}
                },
                "plain": {"type": "string"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_keys_match_schema_group_paths() {
        let schema = grouped_schema();
        let attrs = ConfigurationAttributes::from_schema(&schema);

        let keys: Vec<_> = attrs.iter().map(|(k, _)| k.clone()).collect();
        let group_paths: Vec<_> = schema
            .group_paths()
            .iter()
            .map(|p| p.to_api_string())
            .collect();
        assert_eq!(keys, group_paths);
        assert!(!attrs.contains(&FieldPath::root().key("plain")));
    }

    #[test]
    fn test_defaults_active_and_synchronized() {
        let attrs = ConfigurationAttributes::from_schema(&grouped_schema());
        let core = attrs.get(&FieldPath::root().key("core")).unwrap();
        assert!(core.is_active);
        assert!(core.is_synchronized);
    }

    #[test]
    fn test_merge_saved_never_invents_or_drops_keys() {
        let mut attrs = ConfigurationAttributes::from_schema(&grouped_schema());
        let saved: ConfigurationAttributes = serde_json::from_value(json!({
            "core": {"isActive": false, "isSynchronized": true},
            "removed_group": {"isActive": false, "isSynchronized": false}
        }))
        .unwrap();

        attrs.merge_saved(&saved);

        assert_eq!(attrs.len(), 2);
        assert!(!attrs.get(&FieldPath::root().key("core")).unwrap().is_active);
        // Stale saved key was not adopted
        assert!(!attrs.contains(&FieldPath::root().key("removed_group")));
        // Missing saved key kept its default
        assert!(attrs.get(&FieldPath::root().key("audit")).unwrap().is_active);
    }

    #[test]
    fn test_wire_serialization_uses_camel_case() {
        let attrs = ConfigurationAttributes::from_schema(&grouped_schema());
        let wire = serde_json::to_value(&attrs).unwrap();
        assert_eq!(
            wire["core"],
            json!({"isActive": true, "isSynchronized": true})
        );
    }
}
