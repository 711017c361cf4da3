//! Engine Services
//!
//! This module contains the configuration engine's core logic:
//!
//! - `interpreter` - projects (schema, document, attributes) into the
//!   ordered render field list
//! - `AttributeReconciler` - precondition-checked group attribute toggles
//! - `ConfigurationSession` - per-entity-view state (draft + revision cache)
//! - `VersionService` - revision listing, lazy loading, saving, comparing
//! - `HostGroupService` - host-group override projection and host
//!   membership reconciliation

pub mod error;
pub mod interpreter;
pub mod override_service;
pub mod reconciler;
pub mod session;
pub mod version_service;

pub use error::ConfigError;
pub use interpreter::{render_fields, EnumOption, FieldKind, RenderField};
pub use override_service::{
    is_locally_owned, override_candidates, project_save_payload, HostGroupService, MappingOutcome,
};
pub use reconciler::AttributeReconciler;
pub use session::ConfigurationSession;
pub use version_service::{
    diff_revisions, AttributeDiff, CompareSelection, CompareSide, ConfigDiff, ValueDiff,
    VersionService,
};
