//! Host-Group Override Projector
//!
//! Config-groups (host-groups) layer partial configuration overrides on top
//! of a parent entity's configuration. Only subtrees whose schema group
//! declares `synchronization.isShown` are override-capable, and a subtree is
//! locally owned by the group iff its `isSynchronized` flag is false. On
//! save, only locally owned subtrees are submitted; synchronized ones are
//! omitted and inherit from the parent at read time.
//!
//! Host membership is reconciled by set difference: resubmitting the same
//! desired membership computes empty add/remove sets and issues no requests.

use crate::api::{ConfigStore, EntityRef, HostView};
use crate::models::{
    ConfigurationAttributes, ConfigurationDocument, FieldPath, SchemaKind, SchemaNode,
};
use crate::services::error::ConfigError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Group paths presented as override-capable in a config-group view
///
/// These are the schema groups with `synchronization.isShown == true`, in
/// declared order.
pub fn override_candidates(schema: &SchemaNode) -> Vec<FieldPath> {
    schema
        .group_paths()
        .into_iter()
        .filter(|path| {
            schema
                .resolve(path)
                .and_then(|node| node.meta.synchronization.as_ref())
                .map(|rule| rule.is_shown)
                .unwrap_or(false)
        })
        .collect()
}

/// Whether the subtree at `path` is locally owned by the config-group
pub fn is_locally_owned(attributes: &ConfigurationAttributes, path: &FieldPath) -> bool {
    attributes
        .get(path)
        .map(|attrs| !attrs.is_synchronized)
        .unwrap_or(false)
}

/// Project the config-group save payload: locally owned subtrees only
///
/// Synchronized subtrees and fields outside any synchronization group are
/// omitted entirely; the parent entity supplies them at read time.
pub fn project_save_payload(
    schema: &SchemaNode,
    document: &ConfigurationDocument,
    attributes: &ConfigurationAttributes,
) -> ConfigurationDocument {
    let mut root = Value::Object(Map::new());
    for path in override_candidates(schema) {
        if !is_locally_owned(attributes, &path) {
            continue;
        }
        if let Some(subtree) = document.get(&path) {
            insert_at(&mut root, &path, subtree.clone());
        }
    }
    ConfigurationDocument::new(root)
}

/// Graft `value` into `root` at `path`, materializing intermediate objects
fn insert_at(root: &mut Value, path: &FieldPath, value: Value) {
    let Some((last, ancestors)) = path.segments().split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for segment in ancestors {
        let map = match node {
            Value::Object(map) => map,
            _ => return,
        };
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}

/// Outcome of a host membership reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Desired membership already in place; no requests issued
    Noop,
    /// Every add/remove request succeeded
    Full { added: usize, removed: usize },
    /// Some requests failed; surfaced as a partial-success notification
    Partial { succeeded: usize, failed: usize },
}

/// Service managing config-group host membership
pub struct HostGroupService {
    store: Arc<dyn ConfigStore>,
}

impl HostGroupService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Hosts currently mapped to the config-group
    pub async fn current_hosts(&self, entity: &EntityRef) -> Result<Vec<HostView>, ConfigError> {
        self.require_group(entity)?;
        Ok(self.store.list_group_hosts(entity).await?)
    }

    /// Hosts eligible for the config-group but not yet mapped
    pub async fn host_candidates(&self, entity: &EntityRef) -> Result<Vec<HostView>, ConfigError> {
        self.require_group(entity)?;
        Ok(self.store.list_host_candidates(entity).await?)
    }

    /// Reconcile the group's membership towards `desired`
    ///
    /// Computes `to_remove = current − desired` and `to_add = desired −
    /// current` and issues one request per host. Idempotent: a desired set
    /// equal to the current membership issues zero requests.
    ///
    /// # Errors
    ///
    /// - `NotConfigGroup`: the entity is not config-group scoped
    /// - `AllHostsFailed`: zero successes out of a non-empty batch
    /// - `Store`: the initial membership fetch failed
    pub async fn reconcile_hosts(
        &self,
        entity: &EntityRef,
        desired: &BTreeSet<i64>,
    ) -> Result<MappingOutcome, ConfigError> {
        self.require_group(entity)?;
        let current: BTreeSet<i64> = self
            .store
            .list_group_hosts(entity)
            .await?
            .into_iter()
            .map(|h| h.id)
            .collect();

        let to_remove: Vec<i64> = current.difference(desired).copied().collect();
        let to_add: Vec<i64> = desired.difference(&current).copied().collect();
        if to_remove.is_empty() && to_add.is_empty() {
            return Ok(MappingOutcome::Noop);
        }
        debug!(
            entity = %entity,
            add = to_add.len(),
            remove = to_remove.len(),
            "reconciling config-group hosts"
        );

        let batch = to_remove.len() + to_add.len();
        let mut failed = 0usize;
        let mut added = 0usize;
        let mut removed = 0usize;

        for host_id in &to_remove {
            match self.store.remove_group_host(entity, *host_id).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(host_id, %error, "failed to unmap host");
                    failed += 1;
                }
            }
        }
        for host_id in &to_add {
            match self.store.add_group_host(entity, *host_id).await {
                Ok(()) => added += 1,
                Err(error) => {
                    warn!(host_id, %error, "failed to map host");
                    failed += 1;
                }
            }
        }

        if failed == batch {
            return Err(ConfigError::AllHostsFailed { failed });
        }
        if failed > 0 {
            return Ok(MappingOutcome::Partial {
                succeeded: batch - failed,
                failed,
            });
        }
        Ok(MappingOutcome::Full { added, removed })
    }

    fn require_group(&self, entity: &EntityRef) -> Result<(), ConfigError> {
        if entity.is_config_group() {
            Ok(())
        } else {
            Err(ConfigError::not_config_group(entity.to_string()))
        }
    }
}
