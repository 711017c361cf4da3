//! ConfigStore Trait - Management API Abstraction Layer
//!
//! This module defines the `ConfigStore` trait that abstracts the remote
//! management API for configuration data. The trait decouples service-layer
//! logic (versioning, host-group reconciliation) from the HTTP transport,
//! which keeps services testable against an in-memory implementation.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every call crosses the network in production; the
//!    in-memory test double resolves immediately
//! 2. **Typed errors**: all methods return [`ApiError`] so services can
//!    classify transport vs. payload failures
//! 3. **No caching here**: revision caching is the session's concern; the
//!    store is a stateless gateway

use crate::api::error::ApiError;
use crate::api::types::{CreateConfigPayload, EntityRef, HostView};
use crate::models::{ConfigRevision, ConfigShortView, SchemaNode};
use async_trait::async_trait;

/// Abstraction over the remote management API's configuration endpoints
///
/// Implementations must be `Send + Sync`; services hold them behind
/// `Arc<dyn ConfigStore>`.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch and parse the entity's configuration schema
    async fn fetch_schema(&self, entity: &EntityRef) -> Result<SchemaNode, ApiError>;

    /// Fetch the entity's revision list (short views only, no payloads)
    async fn list_revisions(&self, entity: &EntityRef) -> Result<Vec<ConfigShortView>, ApiError>;

    /// Fetch one revision's full payload
    async fn load_revision(&self, entity: &EntityRef, id: i64) -> Result<ConfigRevision, ApiError>;

    /// Create a new revision; the server assigns its id and marks it current
    async fn create_revision(
        &self,
        entity: &EntityRef,
        payload: &CreateConfigPayload,
    ) -> Result<ConfigRevision, ApiError>;

    /// Current host membership of a config-group
    async fn list_group_hosts(&self, entity: &EntityRef) -> Result<Vec<HostView>, ApiError>;

    /// Hosts eligible for the config-group but not yet assigned
    async fn list_host_candidates(&self, entity: &EntityRef) -> Result<Vec<HostView>, ApiError>;

    /// Add one host to a config-group
    async fn add_group_host(&self, entity: &EntityRef, host_id: i64) -> Result<(), ApiError>;

    /// Remove one host from a config-group
    async fn remove_group_host(&self, entity: &EntityRef, host_id: i64) -> Result<(), ApiError>;
}
