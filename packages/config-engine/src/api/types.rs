//! Management API Wire Types
//!
//! Entity addressing and request/response payloads for the uniform
//! configuration endpoints:
//!
//! - `GET {collection}/{id}/config-schema/`
//! - `GET {collection}/{id}/configs/?offset=0&limit=1000`
//! - `GET {collection}/{id}/configs/{configId}/`
//! - `POST {collection}/{id}/configs/`
//!
//! Config-group variants nest `/config-groups/{groupId}/` between the entity
//! id and `configs/`; host membership lives under
//! `/config-groups/{groupId}/hosts/` and `/host-candidates/`.

use crate::models::{ConfigurationAttributes, ConfigurationDocument};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a configurable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Cluster,
    Service,
    Component,
    Host,
    HostProvider,
    /// Global settings; the collection has a single well-known entry
    Settings,
}

impl EntityKind {
    /// REST collection segment for this entity kind
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Cluster => "clusters",
            EntityKind::Service => "services",
            EntityKind::Component => "components",
            EntityKind::Host => "hosts",
            EntityKind::HostProvider => "hostproviders",
            EntityKind::Settings => "adcm",
        }
    }
}

/// Address of one configurable entity, optionally scoped to a config-group
///
/// Every entity owns one independent schema tree and revision list. A
/// config-group reference addresses the override layer of its parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
    /// Config-group (host-group) scope, if any
    pub group_id: Option<i64>,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self {
            kind,
            id,
            group_id: None,
        }
    }

    /// Address the override layer of a config-group under this entity
    pub fn config_group(kind: EntityKind, id: i64, group_id: i64) -> Self {
        Self {
            kind,
            id,
            group_id: Some(group_id),
        }
    }

    /// Whether this reference addresses a config-group override layer
    pub fn is_config_group(&self) -> bool {
        self.group_id.is_some()
    }

    fn base(&self) -> String {
        match self.group_id {
            Some(group_id) => format!(
                "{}/{}/config-groups/{}",
                self.kind.collection(),
                self.id,
                group_id
            ),
            None => format!("{}/{}", self.kind.collection(), self.id),
        }
    }

    /// `{base}/config-schema/`
    pub fn schema_path(&self) -> String {
        format!("{}/config-schema/", self.base())
    }

    /// `{base}/configs/`
    pub fn configs_path(&self) -> String {
        format!("{}/configs/", self.base())
    }

    /// `{base}/configs/{config_id}/`
    pub fn config_path(&self, config_id: i64) -> String {
        format!("{}/configs/{}/", self.base(), config_id)
    }

    /// `{base}/hosts/` — only meaningful for config-group references
    pub fn hosts_path(&self) -> Option<String> {
        self.group_id.map(|_| format!("{}/hosts/", self.base()))
    }

    /// `{base}/hosts/{host_id}/` — only meaningful for config-group
    /// references
    pub fn host_path(&self, host_id: i64) -> Option<String> {
        self.group_id
            .map(|_| format!("{}/hosts/{}/", self.base(), host_id))
    }

    /// `{base}/host-candidates/` — only meaningful for config-group
    /// references
    pub fn host_candidates_path(&self) -> Option<String> {
        self.group_id
            .map(|_| format!("{}/host-candidates/", self.base()))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())
    }
}

/// Paged list envelope used by collection endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// Body of `POST {base}/configs/`
#[derive(Debug, Clone, Serialize)]
pub struct CreateConfigPayload {
    pub description: String,
    #[serde(rename = "adcmMeta")]
    pub attributes: ConfigurationAttributes,
    pub config: ConfigurationDocument,
}

/// Host entry as returned by membership and candidate endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostView {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_paths() {
        let cluster = EntityRef::new(EntityKind::Cluster, 3);
        assert_eq!(cluster.schema_path(), "clusters/3/config-schema/");
        assert_eq!(cluster.configs_path(), "clusters/3/configs/");
        assert_eq!(cluster.config_path(12), "clusters/3/configs/12/");
        assert_eq!(cluster.hosts_path(), None);
    }

    #[test]
    fn test_config_group_paths_nest_group_segment() {
        let group = EntityRef::config_group(EntityKind::Cluster, 3, 7);
        assert!(group.is_config_group());
        assert_eq!(
            group.configs_path(),
            "clusters/3/config-groups/7/configs/"
        );
        assert_eq!(
            group.hosts_path().unwrap(),
            "clusters/3/config-groups/7/hosts/"
        );
        assert_eq!(
            group.host_path(42).unwrap(),
            "clusters/3/config-groups/7/hosts/42/"
        );
        assert_eq!(
            group.host_candidates_path().unwrap(),
            "clusters/3/config-groups/7/host-candidates/"
        );
    }
}
