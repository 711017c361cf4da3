//! Configuration Revisions
//!
//! Saved configurations are immutable, server-assigned revisions. The list
//! view carries lightweight [`ConfigShortView`] entries; full payloads are
//! loaded lazily per revision. Unsaved in-progress edits live in a synthetic
//! draft revision with id [`DRAFT_ID`], which is never persisted until
//! explicitly saved.

use crate::models::attributes::ConfigurationAttributes;
use crate::models::document::ConfigurationDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Synthetic id of the unsaved draft revision
pub const DRAFT_ID: i64 = 0;

/// Lightweight revision descriptor for list views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigShortView {
    pub id: i64,
    #[serde(default)]
    pub is_current: bool,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

/// Full configuration revision: document plus attribute map
///
/// Immutable once created; editing always clones the config into the draft
/// and saving produces a new revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRevision {
    pub id: i64,
    #[serde(default)]
    pub is_current: bool,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub config: ConfigurationDocument,
    #[serde(rename = "adcmMeta", default)]
    pub attributes: ConfigurationAttributes,
}

impl ConfigRevision {
    /// Whether this is the synthetic draft revision
    pub fn is_draft(&self) -> bool {
        self.id == DRAFT_ID
    }

    /// Project the lightweight list-view descriptor
    pub fn short_view(&self) -> ConfigShortView {
        ConfigShortView {
            id: self.id,
            is_current: self.is_current,
            creation_time: self.creation_time,
            description: self.description.clone(),
        }
    }
}
