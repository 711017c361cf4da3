//! Service Layer Error Types
//!
//! This module defines error types for the configuration engine's service
//! operations. Structural schema/document mismatches are *not* represented
//! here: the interpreter recovers them per-field. These errors cover
//! precondition rejections and remote API failures that the UI surfaces as
//! notifications.

use crate::api::ApiError;
use crate::models::{DocumentError, PathError, SchemaError};
use thiserror::Error;

/// Configuration engine operation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The addressed group path is not declared in the attribute map
    #[error("Unknown configuration group: {path}")]
    GroupNotFound { path: String },

    /// The group's schema metadata forbids toggling this flag; the request
    /// is rejected before any mutation
    #[error("Changing {flag} is not allowed for group: {path}")]
    ChangeNotAllowed { path: String, flag: &'static str },

    /// The revision list reported no current revision
    #[error("No current revision reported by the server")]
    NoCurrentRevision,

    /// The revision list reported more than one current revision
    #[error("Multiple current revisions reported by the server ({count})")]
    MultipleCurrentRevisions { count: usize },

    /// A requested revision id is unknown
    #[error("Revision not found: {id}")]
    RevisionNotFound { id: i64 },

    /// The operation requires a config-group scoped entity
    #[error("Operation requires a config-group entity, got '{entity}'")]
    NotConfigGroup { entity: String },

    /// Zero successes out of a non-empty host mapping batch
    #[error("All hosts can not be mapped: {failed} request(s) failed")]
    AllHostsFailed { failed: usize },

    /// Document update rejected
    #[error("Document update rejected: {0}")]
    Document(#[from] DocumentError),

    /// Schema parse/validation failure
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Field path failure
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Remote management API failure; the draft is left untouched so the
    /// operation can be retried
    #[error("Management API request failed: {0}")]
    Store(#[from] ApiError),
}

impl ConfigError {
    /// Create a group not found error
    pub fn group_not_found(path: impl Into<String>) -> Self {
        Self::GroupNotFound { path: path.into() }
    }

    /// Create a change not allowed error
    pub fn change_not_allowed(path: impl Into<String>, flag: &'static str) -> Self {
        Self::ChangeNotAllowed {
            path: path.into(),
            flag,
        }
    }

    /// Create a revision not found error
    pub fn revision_not_found(id: i64) -> Self {
        Self::RevisionNotFound { id }
    }

    /// Create a not-config-group error
    pub fn not_config_group(entity: impl Into<String>) -> Self {
        Self::NotConfigGroup {
            entity: entity.into(),
        }
    }
}
