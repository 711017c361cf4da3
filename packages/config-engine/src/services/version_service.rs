//! Version/Compare Manager
//!
//! Fetches, caches, and diffs configuration revisions through a
//! [`ConfigStore`]. Revision short lists never carry payloads; full
//! revisions are loaded lazily and cached in the session. The synthetic
//! draft (id 0) is served from the session and never hits the store.
//!
//! Save semantics: a failed `create_revision` leaves the draft untouched so
//! the user can retry; a successful one marks the new revision current,
//! refreshes the short list, and re-seeds the draft from the saved payload.

use crate::api::{ConfigStore, CreateConfigPayload, EntityRef};
use crate::models::{
    ConfigRevision, ConfigShortView, FieldAttributes, FieldPath, DRAFT_ID,
};
use crate::services::error::ConfigError;
use crate::services::session::ConfigurationSession;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Service managing an entity's configuration revisions
pub struct VersionService {
    store: Arc<dyn ConfigStore>,
}

impl VersionService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Open a configuration session for an entity: fetch the schema, the
    /// revision list, and the current revision's payload.
    ///
    /// An entity with no revisions yet opens with a defaults-seeded draft.
    /// A non-empty list without exactly one current revision is a server
    /// contract violation and is surfaced as an error, never papered over
    /// by picking one.
    pub async fn open_session(&self, entity: EntityRef) -> Result<ConfigurationSession, ConfigError> {
        let schema = Arc::new(self.store.fetch_schema(&entity).await?);
        let revisions = validate_revision_list(self.store.list_revisions(&entity).await?)?;

        let current = revisions.iter().find(|r| r.is_current).map(|r| r.id);
        let base = match current {
            Some(id) => Some(self.store.load_revision(&entity, id).await?),
            None => None,
        };

        let mut session = ConfigurationSession::open(entity, schema, base);
        session.set_revisions(revisions);
        Ok(session)
    }

    /// Re-fetch and validate the revision short list
    pub async fn refresh_revisions(
        &self,
        session: &mut ConfigurationSession,
    ) -> Result<(), ConfigError> {
        let revisions =
            validate_revision_list(self.store.list_revisions(session.entity()).await?)?;
        session.set_revisions(revisions);
        Ok(())
    }

    /// Select a revision for display, loading its payload lazily
    ///
    /// Selecting [`DRAFT_ID`] never calls the store. On a load failure the
    /// previous selection is left in place so the view keeps showing what
    /// it had.
    pub async fn select_revision(
        &self,
        session: &mut ConfigurationSession,
        id: i64,
    ) -> Result<(), ConfigError> {
        if id == DRAFT_ID {
            session.select(DRAFT_ID);
            return Ok(());
        }
        if session.cached(id).is_none() {
            let revision = self.store.load_revision(session.entity(), id).await?;
            session.cache_revision(revision);
        }
        session.select(id);
        Ok(())
    }

    /// Submit the draft as a new immutable revision
    ///
    /// Returns the server-assigned revision id. On failure the draft is
    /// untouched and the error is surfaced for a retry notification.
    pub async fn save_draft(
        &self,
        session: &mut ConfigurationSession,
        description: &str,
    ) -> Result<i64, ConfigError> {
        let payload = CreateConfigPayload {
            description: description.to_string(),
            attributes: session.draft_attributes().clone(),
            config: session.draft().clone(),
        };
        let created = self.store.create_revision(session.entity(), &payload).await?;
        debug!(id = created.id, "created configuration revision");

        let created_id = created.id;
        session.cache_revision(created);

        // Refresh the short list; if that secondary fetch fails, fall back
        // to updating the list locally rather than failing the save.
        match self.store.list_revisions(session.entity()).await {
            Ok(list) => session.set_revisions(validate_revision_list(list)?),
            Err(error) => {
                warn!(%error, "revision list refresh failed after save");
                let mut list: Vec<ConfigShortView> = session
                    .revisions()
                    .iter()
                    .map(|r| ConfigShortView {
                        is_current: false,
                        ..r.clone()
                    })
                    .collect();
                if let Some(created) = session.cached(created_id) {
                    list.insert(0, created.short_view());
                }
                session.set_revisions(list);
            }
        }

        session.reset_draft_from(created_id)?;
        Ok(created_id)
    }

    /// Resolve the left side of a compare view
    pub async fn select_left(
        &self,
        compare: &mut CompareSelection,
        entity: &EntityRef,
        id: i64,
    ) -> Result<(), ConfigError> {
        compare.left = Some(self.load_side(entity, id).await?);
        Ok(())
    }

    /// Resolve the right side of a compare view
    ///
    /// The two sides resolve independently: the same revision on both sides
    /// and sides from different entities are both valid.
    pub async fn select_right(
        &self,
        compare: &mut CompareSelection,
        entity: &EntityRef,
        id: i64,
    ) -> Result<(), ConfigError> {
        compare.right = Some(self.load_side(entity, id).await?);
        Ok(())
    }

    async fn load_side(&self, entity: &EntityRef, id: i64) -> Result<CompareSide, ConfigError> {
        if id == DRAFT_ID {
            // Compare works on persisted revisions only
            return Err(ConfigError::revision_not_found(DRAFT_ID));
        }
        let revision = self.store.load_revision(entity, id).await?;
        Ok(CompareSide {
            entity: entity.clone(),
            revision,
        })
    }
}

/// Sort newest-first and enforce the exactly-one-current contract
fn validate_revision_list(
    mut revisions: Vec<ConfigShortView>,
) -> Result<Vec<ConfigShortView>, ConfigError> {
    revisions.sort_by(|a, b| {
        b.creation_time
            .cmp(&a.creation_time)
            .then(b.id.cmp(&a.id))
    });
    if revisions.is_empty() {
        return Ok(revisions);
    }
    match revisions.iter().filter(|r| r.is_current).count() {
        1 => Ok(revisions),
        0 => Err(ConfigError::NoCurrentRevision),
        count => Err(ConfigError::MultipleCurrentRevisions { count }),
    }
}

/// One resolved side of a compare view
#[derive(Debug, Clone)]
pub struct CompareSide {
    pub entity: EntityRef,
    pub revision: ConfigRevision,
}

/// Independently resolved left/right revisions for side-by-side diffing
#[derive(Debug, Default)]
pub struct CompareSelection {
    left: Option<CompareSide>,
    right: Option<CompareSide>,
}

impl CompareSelection {
    pub fn left(&self) -> Option<&CompareSide> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&CompareSide> {
        self.right.as_ref()
    }

    /// Drop compare state only; loaded sessions and drafts are unaffected
    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }

    /// Diff the two sides, once both are resolved
    pub fn diff(&self) -> Option<ConfigDiff> {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => Some(diff_revisions(&left.revision, &right.revision)),
            _ => None,
        }
    }
}

/// One differing document field
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDiff {
    pub path: FieldPath,
    pub left: Option<Value>,
    pub right: Option<Value>,
}

/// One differing attribute entry
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDiff {
    pub path: String,
    pub left: Option<FieldAttributes>,
    pub right: Option<FieldAttributes>,
}

/// Flat, path-keyed difference between two revisions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDiff {
    pub values: Vec<ValueDiff>,
    pub attributes: Vec<AttributeDiff>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.attributes.is_empty()
    }
}

/// Compute the field-level difference between two revisions
///
/// Documents are flattened to leaf paths; a path present on one side only
/// diffs against `None`. Diffing a revision against itself is empty. The
/// two revisions need not belong to the same entity or schema.
pub fn diff_revisions(left: &ConfigRevision, right: &ConfigRevision) -> ConfigDiff {
    let mut left_leaves = BTreeMap::new();
    flatten(left.config.root(), FieldPath::root(), &mut left_leaves);
    let mut right_leaves = BTreeMap::new();
    flatten(right.config.root(), FieldPath::root(), &mut right_leaves);

    let mut values = Vec::new();
    for (path, left_value) in &left_leaves {
        match right_leaves.get(path) {
            Some(right_value) if right_value == left_value => {}
            other => values.push(ValueDiff {
                path: path.clone(),
                left: Some(left_value.clone()),
                right: other.cloned(),
            }),
        }
    }
    for (path, right_value) in &right_leaves {
        if !left_leaves.contains_key(path) {
            values.push(ValueDiff {
                path: path.clone(),
                left: None,
                right: Some(right_value.clone()),
            });
        }
    }

    let mut attributes = Vec::new();
    for (key, left_attrs) in left.attributes.iter() {
        let right_attrs = right
            .attributes
            .get(&FieldPath::from_api_string(key).unwrap_or_default());
        if right_attrs != Some(left_attrs) {
            attributes.push(AttributeDiff {
                path: key.clone(),
                left: Some(*left_attrs),
                right: right_attrs.copied(),
            });
        }
    }
    for (key, right_attrs) in right.attributes.iter() {
        let known = left
            .attributes
            .get(&FieldPath::from_api_string(key).unwrap_or_default())
            .is_some();
        if !known {
            attributes.push(AttributeDiff {
                path: key.clone(),
                left: None,
                right: Some(*right_attrs),
            });
        }
    }

    ConfigDiff { values, attributes }
}

/// Flatten a value tree to its leaf paths. Empty containers count as leaves
/// so sentinel-level differences stay visible.
fn flatten(value: &Value, path: FieldPath, out: &mut BTreeMap<FieldPath, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten(child, path.clone().key(key.clone()), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (idx, child) in items.iter().enumerate() {
                flatten(child, path.clone().index(idx), out);
            }
        }
        other => {
            out.insert(path, other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_store::MockConfigStore;
    use crate::api::EntityKind;
    use crate::models::{ConfigurationDocument, SchemaNode};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn schema() -> SchemaNode {
        SchemaNode::parse(json!({
            "type": "object",
            "properties": {
                "core": {
                    "type": "object",
                    "adcmMeta": {"activation": {"isShown": true, "isAllowChange": true}, "nullValue": {}},
                    "properties": {"workers": {"type": "integer", "default": 4}}
                }
            }
        }))
        .unwrap()
    }

    fn revision(id: i64, is_current: bool, day: u32, workers: i64) -> ConfigRevision {
        ConfigRevision {
            id,
            is_current,
            creation_time: Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap(),
            description: format!("rev {id}"),
            config: ConfigurationDocument::new(json!({"core": {"workers": workers}})),
            attributes: serde_json::from_value(
                json!({"core": {"isActive": true, "isSynchronized": true}}),
            )
            .unwrap(),
        }
    }

    fn seeded_store() -> Arc<MockConfigStore> {
        let store = MockConfigStore::new().with_schema(schema());
        store.push_revision(revision(4, false, 1, 1));
        store.push_revision(revision(9, false, 5, 2));
        store.push_revision(revision(10, true, 9, 3));
        Arc::new(store)
    }

    fn entity() -> EntityRef {
        EntityRef::new(EntityKind::Cluster, 1)
    }

    #[tokio::test]
    async fn test_open_session_loads_current_revision() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());

        let session = service.open_session(entity()).await.unwrap();

        // Newest first, exactly one current
        let ids: Vec<_> = session.revisions().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 9, 4]);
        assert_eq!(
            session.revisions().iter().filter(|r| r.is_current).count(),
            1
        );
        assert_eq!(session.selected_id(), 10);
        assert_eq!(
            session.draft().root(),
            &json!({"core": {"workers": 3}})
        );
    }

    #[tokio::test]
    async fn test_open_session_without_revisions_seeds_defaults() {
        let store = Arc::new(MockConfigStore::new().with_schema(schema()));
        let service = VersionService::new(store);

        let session = service.open_session(entity()).await.unwrap();
        assert_eq!(session.selected_id(), DRAFT_ID);
        assert_eq!(session.draft().root(), &json!({"core": {"workers": 4}}));
    }

    #[tokio::test]
    async fn test_no_current_revision_is_an_error() {
        let store = MockConfigStore::new().with_schema(schema());
        store.push_revision(revision(4, false, 1, 1));
        let service = VersionService::new(Arc::new(store));

        let err = service.open_session(entity()).await.unwrap_err();
        assert!(matches!(err, ConfigError::NoCurrentRevision));
    }

    #[tokio::test]
    async fn test_multiple_current_revisions_is_an_error() {
        let store = MockConfigStore::new().with_schema(schema());
        store.push_revision(revision(4, true, 1, 1));
        store.push_revision(revision(9, true, 5, 2));
        let service = VersionService::new(Arc::new(store));

        let err = service.open_session(entity()).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MultipleCurrentRevisions { count: 2 }
        ));
    }

    #[tokio::test]
    async fn test_selecting_draft_never_calls_store() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();
        let loads_after_open = store.load_calls();

        service
            .select_revision(&mut session, DRAFT_ID)
            .await
            .unwrap();
        assert_eq!(session.selected_id(), DRAFT_ID);
        assert_eq!(store.load_calls(), loads_after_open);
    }

    #[tokio::test]
    async fn test_select_revision_is_lazy_and_cached() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();
        let loads_after_open = store.load_calls();

        service.select_revision(&mut session, 9).await.unwrap();
        assert_eq!(session.selected_id(), 9);
        assert_eq!(store.load_calls(), loads_after_open + 1);

        // Second selection hits the cache
        service.select_revision(&mut session, 9).await.unwrap();
        assert_eq!(store.load_calls(), loads_after_open + 1);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_selection() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();

        store.fail_load(true);
        let err = service.select_revision(&mut session, 9).await.unwrap_err();
        assert!(matches!(err, ConfigError::Store(_)));
        // The previously selected revision stays displayed
        assert_eq!(session.selected_id(), 10);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_list() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();

        store.fail_list(true);
        let err = service.refresh_revisions(&mut session).await.unwrap_err();
        assert!(matches!(err, ConfigError::Store(_)));
        assert_eq!(session.revisions().len(), 3);
    }

    #[tokio::test]
    async fn test_save_draft_creates_current_and_reseeds() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();

        session
            .set_value(&FieldPath::root().key("core").key("workers"), json!(64))
            .unwrap();
        let new_id = service.save_draft(&mut session, "scale up").await.unwrap();

        assert!(new_id > 10);
        assert_eq!(session.selected_id(), new_id);
        assert_eq!(session.revisions()[0].id, new_id);
        assert!(session.revisions()[0].is_current);
        assert_eq!(
            session.revisions().iter().filter(|r| r.is_current).count(),
            1
        );
        assert_eq!(
            session.draft().root(),
            &json!({"core": {"workers": 64}})
        );
        assert_eq!(store.revision_count(), 4);
    }

    #[tokio::test]
    async fn test_save_failure_preserves_draft() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut session = service.open_session(entity()).await.unwrap();

        let workers = FieldPath::root().key("core").key("workers");
        session.set_value(&workers, json!(64)).unwrap();
        store.fail_create(true);

        let err = service.save_draft(&mut session, "scale up").await.unwrap_err();
        assert!(matches!(err, ConfigError::Store(_)));
        // The in-flight edit context is intact for a retry
        assert_eq!(session.draft().get(&workers), Some(&json!(64)));
        assert_eq!(store.revision_count(), 3);
    }

    #[tokio::test]
    async fn test_compare_same_revision_yields_empty_diff() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut compare = CompareSelection::default();

        service.select_left(&mut compare, &entity(), 10).await.unwrap();
        service.select_right(&mut compare, &entity(), 10).await.unwrap();

        let diff = compare.diff().unwrap();
        assert!(diff.is_empty());

        compare.clear();
        assert!(compare.diff().is_none());
    }

    #[tokio::test]
    async fn test_compare_detects_value_changes() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut compare = CompareSelection::default();

        service.select_left(&mut compare, &entity(), 9).await.unwrap();
        service.select_right(&mut compare, &entity(), 10).await.unwrap();

        let diff = compare.diff().unwrap();
        assert_eq!(diff.values.len(), 1);
        assert_eq!(diff.values[0].path.to_api_string(), "core/workers");
        assert_eq!(diff.values[0].left, Some(json!(2)));
        assert_eq!(diff.values[0].right, Some(json!(3)));
        assert!(diff.attributes.is_empty());
    }

    #[tokio::test]
    async fn test_compare_rejects_draft_side() {
        let store = seeded_store();
        let service = VersionService::new(store.clone());
        let mut compare = CompareSelection::default();

        let err = service
            .select_left(&mut compare, &entity(), DRAFT_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::RevisionNotFound { id: 0 }));
        assert_eq!(store.load_calls(), 0);
    }

    #[test]
    fn test_diff_reports_one_sided_paths() {
        let left = revision(1, false, 1, 1);
        let mut right = revision(2, true, 2, 1);
        right.config = ConfigurationDocument::new(json!({"core": {}}));

        let diff = diff_revisions(&left, &right);
        assert_eq!(diff.values.len(), 2);
        let paths: Vec<_> = diff.values.iter().map(|d| d.path.to_api_string()).collect();
        assert!(paths.contains(&"core/workers".to_string()));
        assert!(paths.contains(&"core".to_string()));
    }

    #[test]
    fn test_diff_reports_attribute_changes() {
        let left = revision(1, false, 1, 1);
        let mut right = revision(2, true, 2, 1);
        right.attributes = serde_json::from_value(
            json!({"core": {"isActive": false, "isSynchronized": true}}),
        )
        .unwrap();

        let diff = diff_revisions(&left, &right);
        assert!(diff.values.is_empty());
        assert_eq!(diff.attributes.len(), 1);
        assert_eq!(diff.attributes[0].path, "core");
        assert!(!diff.attributes[0].right.unwrap().is_active);
    }

    #[test]
    fn test_revision_list_sorted_with_id_tiebreak() {
        let mut list = vec![
            ConfigShortView {
                id: 7,
                is_current: false,
                creation_time: Utc.with_ymd_and_hms(2026, 8, 9, 12, 0, 0).unwrap(),
                description: String::new(),
            },
            ConfigShortView {
                id: 10,
                is_current: true,
                creation_time: Utc.with_ymd_and_hms(2026, 8, 9, 12, 0, 0).unwrap(),
                description: String::new(),
            },
        ];
        list = validate_revision_list(list).unwrap();
        assert_eq!(list[0].id, 10);
    }

    #[test]
    fn test_empty_revision_list_is_valid() {
        assert!(validate_revision_list(Vec::new()).unwrap().is_empty());
    }
}
