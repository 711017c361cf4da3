//! In-memory ConfigStore used by service tests
//!
//! Backs the `ConfigStore` trait with plain maps plus per-endpoint failure
//! injection and call counters, so version and host-group services can be
//! exercised without a network.

use crate::api::config_store::ConfigStore;
use crate::api::error::ApiError;
use crate::api::types::{CreateConfigPayload, EntityRef, HostView};
use crate::models::{ConfigRevision, ConfigShortView, SchemaNode};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    schema: Option<SchemaNode>,
    revisions: Vec<ConfigRevision>,
    hosts: Vec<HostView>,
    candidates: Vec<HostView>,
    next_id: i64,
    // Failure injection
    fail_list: bool,
    fail_load: bool,
    fail_create: bool,
    fail_host_ids: HashSet<i64>,
    // Call counters
    load_calls: usize,
    add_calls: usize,
    remove_calls: usize,
}

pub(crate) struct MockConfigStore {
    inner: Mutex<Inner>,
}

impl MockConfigStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
        }
    }

    pub fn with_schema(self, schema: SchemaNode) -> Self {
        self.inner.lock().unwrap().schema = Some(schema);
        self
    }

    pub fn with_hosts(self, hosts: Vec<HostView>) -> Self {
        self.inner.lock().unwrap().hosts = hosts;
        self
    }

    pub fn with_candidates(self, candidates: Vec<HostView>) -> Self {
        self.inner.lock().unwrap().candidates = candidates;
        self
    }

    /// Seed a saved revision; the last one pushed with `is_current` wins as
    /// the server's current marker only if the caller says so (the mock does
    /// not enforce the invariant, tests drive it both ways).
    pub fn push_revision(&self, revision: ConfigRevision) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id = inner.next_id.max(revision.id + 1);
        inner.revisions.push(revision);
    }

    pub fn fail_list(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list = fail;
    }

    pub fn fail_load(&self, fail: bool) {
        self.inner.lock().unwrap().fail_load = fail;
    }

    pub fn fail_create(&self, fail: bool) {
        self.inner.lock().unwrap().fail_create = fail;
    }

    /// Make add/remove of specific hosts fail
    pub fn fail_hosts(&self, ids: impl IntoIterator<Item = i64>) {
        self.inner.lock().unwrap().fail_host_ids = ids.into_iter().collect();
    }

    pub fn load_calls(&self) -> usize {
        self.inner.lock().unwrap().load_calls
    }

    pub fn add_calls(&self) -> usize {
        self.inner.lock().unwrap().add_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.inner.lock().unwrap().remove_calls
    }

    pub fn host_ids(&self) -> Vec<i64> {
        self.inner
            .lock()
            .unwrap()
            .hosts
            .iter()
            .map(|h| h.id)
            .collect()
    }

    pub fn revision_count(&self) -> usize {
        self.inner.lock().unwrap().revisions.len()
    }

    fn unavailable() -> ApiError {
        ApiError::http(503, "injected failure")
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn fetch_schema(&self, _entity: &EntityRef) -> Result<SchemaNode, ApiError> {
        self.inner
            .lock()
            .unwrap()
            .schema
            .clone()
            .ok_or_else(|| ApiError::http(404, "no schema seeded"))
    }

    async fn list_revisions(&self, _entity: &EntityRef) -> Result<Vec<ConfigShortView>, ApiError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_list {
            return Err(Self::unavailable());
        }
        Ok(inner.revisions.iter().map(|r| r.short_view()).collect())
    }

    async fn load_revision(&self, _entity: &EntityRef, id: i64) -> Result<ConfigRevision, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.load_calls += 1;
        if inner.fail_load {
            return Err(Self::unavailable());
        }
        inner
            .revisions
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ApiError::http(404, format!("revision {id} not found")))
    }

    async fn create_revision(
        &self,
        _entity: &EntityRef,
        payload: &CreateConfigPayload,
    ) -> Result<ConfigRevision, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_create {
            return Err(Self::unavailable());
        }
        for revision in &mut inner.revisions {
            revision.is_current = false;
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let revision = ConfigRevision {
            id,
            is_current: true,
            creation_time: Utc::now(),
            description: payload.description.clone(),
            config: payload.config.clone(),
            attributes: payload.attributes.clone(),
        };
        inner.revisions.push(revision.clone());
        Ok(revision)
    }

    async fn list_group_hosts(&self, _entity: &EntityRef) -> Result<Vec<HostView>, ApiError> {
        Ok(self.inner.lock().unwrap().hosts.clone())
    }

    async fn list_host_candidates(&self, _entity: &EntityRef) -> Result<Vec<HostView>, ApiError> {
        Ok(self.inner.lock().unwrap().candidates.clone())
    }

    async fn add_group_host(&self, _entity: &EntityRef, host_id: i64) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.add_calls += 1;
        if inner.fail_host_ids.contains(&host_id) {
            return Err(Self::unavailable());
        }
        inner.hosts.push(HostView {
            id: host_id,
            name: format!("host-{host_id}"),
        });
        Ok(())
    }

    async fn remove_group_host(&self, _entity: &EntityRef, host_id: i64) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.remove_calls += 1;
        if inner.fail_host_ids.contains(&host_id) {
            return Err(Self::unavailable());
        }
        inner.hosts.retain(|h| h.id != host_id);
        Ok(())
    }
}
