//! ClusterHub Configuration Engine
//!
//! This crate implements the schema-driven configuration engine of the
//! ClusterHub management console. It interprets server-supplied
//! JSON-Schema-like entity schemas (with a per-node `adcmMeta` extension),
//! manages editable configuration documents with per-group attributes,
//! tracks immutable saved revisions, and projects host-group overrides.
//!
//! # Architecture
//!
//! - **Schema as a tagged union**: node kinds are matched exhaustively, and
//!   each node carries its edit-behavior metadata
//! - **Validated drafts**: the draft document is mutated only through
//!   schema-checked path updates and is never partially invalid
//! - **Store abstraction**: services talk to the remote management API
//!   through the `ConfigStore` trait; the HTTP implementation is one of its
//!   consumers
//! - **Graceful degradation**: schema/document mismatches reset single
//!   fields to their declared null value instead of failing the view
//!
//! # Modules
//!
//! - [`models`] - schema, document, attributes, revisions, field paths
//! - [`services`] - interpreter, reconciler, session, version and
//!   host-group services
//! - [`api`] - entity addressing, the `ConfigStore` trait, HTTP client

pub mod api;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use api::*;
pub use models::*;
pub use services::*;
