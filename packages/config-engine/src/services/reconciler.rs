//! Attribute Reconciler
//!
//! Toggles activation/synchronization flags on configuration groups, with
//! precondition checks against the schema's group rules. Toggling never
//! touches document values: deactivating a group hides and disables its
//! fields but keeps their data, so reactivation restores prior edits.

use crate::models::{ConfigurationAttributes, FieldPath, SchemaNode};
use crate::services::error::ConfigError;
use tracing::debug;

/// Reconciles group attributes against the schema's change rules
pub struct AttributeReconciler<'a> {
    schema: &'a SchemaNode,
}

impl<'a> AttributeReconciler<'a> {
    pub fn new(schema: &'a SchemaNode) -> Self {
        Self { schema }
    }

    /// Set a group's activation flag
    ///
    /// # Errors
    ///
    /// - `GroupNotFound`: the path is not a declared group
    /// - `ChangeNotAllowed`: the group declares no activation rule or its
    ///   `isAllowChange` is false; rejected before any mutation
    pub fn set_group_active(
        &self,
        attributes: &mut ConfigurationAttributes,
        path: &FieldPath,
        is_active: bool,
    ) -> Result<(), ConfigError> {
        let node = self.group_node(attributes, path)?;
        let allowed = node
            .meta
            .activation
            .as_ref()
            .map(|rule| rule.is_allow_change)
            .unwrap_or(false);
        if !allowed {
            return Err(ConfigError::change_not_allowed(
                path.to_api_string(),
                "activation",
            ));
        }

        debug!(path = %path, is_active, "toggle group activation");
        // Precondition checks passed; the entry is known to exist.
        if let Some(entry) = attributes.get_mut(path) {
            entry.is_active = is_active;
        }
        Ok(())
    }

    /// Set a group's synchronization flag
    ///
    /// Only meaningful on config-group (host-group) documents: `false`
    /// marks the subtree as locally overridden rather than inherited.
    ///
    /// # Errors
    ///
    /// Same shape as [`AttributeReconciler::set_group_active`], gated by the
    /// `synchronization` rule.
    pub fn set_group_synchronized(
        &self,
        attributes: &mut ConfigurationAttributes,
        path: &FieldPath,
        is_synchronized: bool,
    ) -> Result<(), ConfigError> {
        let node = self.group_node(attributes, path)?;
        let allowed = node
            .meta
            .synchronization
            .as_ref()
            .map(|rule| rule.is_allow_change)
            .unwrap_or(false);
        if !allowed {
            return Err(ConfigError::change_not_allowed(
                path.to_api_string(),
                "synchronization",
            ));
        }

        debug!(path = %path, is_synchronized, "toggle group synchronization");
        if let Some(entry) = attributes.get_mut(path) {
            entry.is_synchronized = is_synchronized;
        }
        Ok(())
    }

    fn group_node(
        &self,
        attributes: &ConfigurationAttributes,
        path: &FieldPath,
    ) -> Result<&'a SchemaNode, ConfigError> {
        if !attributes.contains(path) {
            return Err(ConfigError::group_not_found(path.to_api_string()));
        }
        self.schema
            .resolve(path)
            .ok_or_else(|| ConfigError::group_not_found(path.to_api_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaNode {
        SchemaNode::parse(json!({
            "type": "object",
            "properties": {
                "core": {
                    "type": "object",
                    "adcmMeta": {"activation": {"isShown": true, "isAllowChange": true}},
                    "properties": {"workers": {"type": "integer"}}
                },
                "pinned": {
                    "type": "object",
                    "adcmMeta": {"activation": {"isShown": true, "isAllowChange": false}},
                    "properties": {"flag": {"type": "boolean"}}
                },
                "audit": {
                    "type": "object",
                    "adcmMeta": {"synchronization": {"isShown": true, "isAllowChange": true}},
                    "properties": {"enabled": {"type": "boolean"}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_toggle_activation() {
        let schema = schema();
        let mut attrs = ConfigurationAttributes::from_schema(&schema);
        let reconciler = AttributeReconciler::new(&schema);
        let core = FieldPath::root().key("core");

        reconciler.set_group_active(&mut attrs, &core, false).unwrap();
        assert!(!attrs.get(&core).unwrap().is_active);

        reconciler.set_group_active(&mut attrs, &core, true).unwrap();
        assert!(attrs.get(&core).unwrap().is_active);
    }

    #[test]
    fn test_change_forbidden_is_rejected_before_mutation() {
        let schema = schema();
        let mut attrs = ConfigurationAttributes::from_schema(&schema);
        let reconciler = AttributeReconciler::new(&schema);
        let pinned = FieldPath::root().key("pinned");
        let before = attrs.clone();

        let err = reconciler
            .set_group_active(&mut attrs, &pinned, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ChangeNotAllowed { .. }));
        assert_eq!(attrs, before);
    }

    #[test]
    fn test_activation_toggle_on_sync_only_group_rejected() {
        let schema = schema();
        let mut attrs = ConfigurationAttributes::from_schema(&schema);
        let reconciler = AttributeReconciler::new(&schema);
        let audit = FieldPath::root().key("audit");

        // audit declares synchronization but no activation rule
        let err = reconciler
            .set_group_active(&mut attrs, &audit, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ChangeNotAllowed { .. }));

        reconciler
            .set_group_synchronized(&mut attrs, &audit, false)
            .unwrap();
        assert!(!attrs.get(&audit).unwrap().is_synchronized);
    }

    #[test]
    fn test_unknown_group_rejected() {
        let schema = schema();
        let mut attrs = ConfigurationAttributes::from_schema(&schema);
        let reconciler = AttributeReconciler::new(&schema);

        let err = reconciler
            .set_group_active(&mut attrs, &FieldPath::root().key("nope"), false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::GroupNotFound { .. }));
        // The reconciler never invents keys
        assert_eq!(attrs.len(), 3);
    }
}
