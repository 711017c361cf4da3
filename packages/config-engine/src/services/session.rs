//! Configuration Session
//!
//! Per-entity-view state container: an immutable schema snapshot, the
//! editable draft (document + attributes), and the lazily loaded revision
//! cache. A session is opened when a configuration view mounts and simply
//! dropped on unmount; drafts are never persisted client-side.
//!
//! The session is an explicit value passed to the interpreter and the
//! version service; there is no ambient shared state, and no two views
//! mutate the same draft.

use crate::api::EntityRef;
use crate::models::{
    ConfigRevision, ConfigShortView, ConfigurationAttributes, ConfigurationDocument, FieldPath,
    SchemaNode, DRAFT_ID,
};
use crate::services::error::ConfigError;
use crate::services::interpreter::{render_fields, RenderField};
use crate::services::reconciler::AttributeReconciler;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Editable configuration state for one entity view
#[derive(Debug, Clone)]
pub struct ConfigurationSession {
    entity: EntityRef,
    /// Read-only snapshot; shared with whatever fetched it
    schema: Arc<SchemaNode>,
    draft: ConfigurationDocument,
    draft_attributes: ConfigurationAttributes,
    revisions: Vec<ConfigShortView>,
    loaded: HashMap<i64, ConfigRevision>,
    selected_id: i64,
}

impl ConfigurationSession {
    /// Open a session, seeding the draft from `base` (usually the current
    /// revision) or from schema defaults when the entity has no
    /// configuration yet.
    pub fn open(entity: EntityRef, schema: Arc<SchemaNode>, base: Option<ConfigRevision>) -> Self {
        let mut draft_attributes = ConfigurationAttributes::from_schema(&schema);
        let mut loaded = HashMap::new();
        let (draft, selected_id) = match base {
            Some(revision) => {
                draft_attributes.merge_saved(&revision.attributes);
                let draft = revision.config.clone();
                let id = revision.id;
                loaded.insert(revision.id, revision);
                (draft, id)
            }
            None => (
                ConfigurationDocument::from_schema_defaults(&schema),
                DRAFT_ID,
            ),
        };
        Self {
            entity,
            schema,
            draft,
            draft_attributes,
            revisions: Vec::new(),
            loaded,
            selected_id,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn draft(&self) -> &ConfigurationDocument {
        &self.draft
    }

    pub fn draft_attributes(&self) -> &ConfigurationAttributes {
        &self.draft_attributes
    }

    /// Short list of saved revisions, newest first
    pub fn revisions(&self) -> &[ConfigShortView] {
        &self.revisions
    }

    /// Currently selected revision id ([`DRAFT_ID`] for the draft)
    pub fn selected_id(&self) -> i64 {
        self.selected_id
    }

    /// The selected revision's payload, if it is a loaded saved revision
    pub fn selected_revision(&self) -> Option<&ConfigRevision> {
        self.loaded.get(&self.selected_id)
    }

    /// Edit one field of the draft; validated against the schema, rejected
    /// whole on mismatch.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), ConfigError> {
        self.draft.set(&self.schema, path, value)?;
        self.selected_id = DRAFT_ID;
        Ok(())
    }

    /// Clear one field of the draft back to its schema sentinel
    pub fn clear_value(&mut self, path: &FieldPath) -> Result<(), ConfigError> {
        self.draft.clear(&self.schema, path)?;
        self.selected_id = DRAFT_ID;
        Ok(())
    }

    /// Toggle a group's activation flag on the draft
    pub fn set_group_active(&mut self, path: &FieldPath, is_active: bool) -> Result<(), ConfigError> {
        AttributeReconciler::new(&self.schema).set_group_active(
            &mut self.draft_attributes,
            path,
            is_active,
        )
    }

    /// Toggle a group's synchronization flag on the draft
    pub fn set_group_synchronized(
        &mut self,
        path: &FieldPath,
        is_synchronized: bool,
    ) -> Result<(), ConfigError> {
        AttributeReconciler::new(&self.schema).set_group_synchronized(
            &mut self.draft_attributes,
            path,
            is_synchronized,
        )
    }

    /// Render the draft through the schema interpreter
    pub fn render(&self) -> Vec<RenderField> {
        render_fields(&self.schema, &self.draft, &self.draft_attributes)
    }

    /// Render a loaded saved revision (read-only view)
    pub fn render_revision(&self, id: i64) -> Option<Vec<RenderField>> {
        let revision = self.loaded.get(&id)?;
        let mut attributes = ConfigurationAttributes::from_schema(&self.schema);
        attributes.merge_saved(&revision.attributes);
        Some(render_fields(&self.schema, &revision.config, &attributes))
    }

    /// Re-seed the draft from a loaded revision, discarding pending edits
    pub fn reset_draft_from(&mut self, id: i64) -> Result<(), ConfigError> {
        let revision = self
            .loaded
            .get(&id)
            .ok_or_else(|| ConfigError::revision_not_found(id))?;
        self.draft = revision.config.clone();
        let mut attributes = ConfigurationAttributes::from_schema(&self.schema);
        attributes.merge_saved(&revision.attributes);
        self.draft_attributes = attributes;
        self.selected_id = id;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Version-service hooks
    // ------------------------------------------------------------------

    pub(crate) fn set_revisions(&mut self, revisions: Vec<ConfigShortView>) {
        self.revisions = revisions;
    }

    pub(crate) fn cached(&self, id: i64) -> Option<&ConfigRevision> {
        self.loaded.get(&id)
    }

    pub(crate) fn cache_revision(&mut self, revision: ConfigRevision) {
        self.loaded.insert(revision.id, revision);
    }

    pub(crate) fn select(&mut self, id: i64) {
        self.selected_id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EntityKind;
    use serde_json::json;

    fn schema() -> Arc<SchemaNode> {
        Arc::new(
            SchemaNode::parse(json!({
                "type": "object",
                "properties": {
                    "core": {
                        "type": "object",
                        "adcmMeta": {"activation": {"isShown": true, "isAllowChange": true}, "nullValue": {}},
                        "properties": {
                            "workers": {"type": "integer", "default": 4}
                        }
                    }
                }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_open_without_base_seeds_defaults() {
        let session = ConfigurationSession::open(
            EntityRef::new(EntityKind::Cluster, 1),
            schema(),
            None,
        );
        assert_eq!(session.selected_id(), DRAFT_ID);
        assert_eq!(session.draft().root(), &json!({"core": {"workers": 4}}));
        assert_eq!(session.draft_attributes().len(), 1);
    }

    #[test]
    fn test_edit_marks_draft_selected() {
        let mut session = ConfigurationSession::open(
            EntityRef::new(EntityKind::Cluster, 1),
            schema(),
            None,
        );
        let path = FieldPath::root().key("core").key("workers");
        session.set_value(&path, json!(16)).unwrap();
        assert_eq!(session.draft().get(&path), Some(&json!(16)));
        assert_eq!(session.selected_id(), DRAFT_ID);
    }

    #[test]
    fn test_deactivate_reactivate_round_trips_values() {
        let mut session = ConfigurationSession::open(
            EntityRef::new(EntityKind::Cluster, 1),
            schema(),
            None,
        );
        let workers = FieldPath::root().key("core").key("workers");
        let group = FieldPath::root().key("core");
        session.set_value(&workers, json!(32)).unwrap();

        session.set_group_active(&group, false).unwrap();
        assert_eq!(session.draft().get(&workers), Some(&json!(32)));

        session.set_group_active(&group, true).unwrap();
        assert_eq!(session.draft().get(&workers), Some(&json!(32)));

        let fields = session.render();
        assert_eq!(fields[0].value, json!(32));
        assert!(fields[0].is_visible);
    }
}
