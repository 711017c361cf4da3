//! Data Models
//!
//! This module contains the core data structures of the configuration
//! engine:
//!
//! - `SchemaNode` - typed recursive configuration schema with `adcmMeta`
//!   edit-behavior metadata
//! - `ConfigurationDocument` - the editable value tree, mutated only through
//!   schema-validated path updates
//! - `ConfigurationAttributes` - per-group activation/synchronization flags
//! - `ConfigRevision` - immutable saved configuration snapshots
//! - `FieldPath` - structured field addressing, stringified only at the API
//!   boundary

pub mod attributes;
pub mod document;
pub mod path;
pub mod revision;
pub mod schema;

pub use attributes::{ConfigurationAttributes, FieldAttributes};
pub use document::{ConfigurationDocument, DocumentError};
pub use path::{FieldPath, PathError, PathSegment};
pub use revision::{ConfigRevision, ConfigShortView, DRAFT_ID};
pub use schema::{
    EnumExtra, GroupRule, SchemaError, SchemaKind, SchemaMeta, SchemaNode, StringExtra,
};
