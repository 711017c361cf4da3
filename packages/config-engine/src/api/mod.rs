//! Management API Layer
//!
//! Typed access to the remote management API's configuration endpoints:
//!
//! - `EntityRef`/`EntityKind` - entity addressing, including config-group
//!   nesting
//! - `ConfigStore` - async trait abstracting the API for the service layer
//! - `HttpConfigStore` - production HTTP implementation

pub mod config_store;
pub mod error;
pub mod http_store;
pub mod types;

#[cfg(test)]
pub(crate) mod mock_store;

pub use config_store::ConfigStore;
pub use error::ApiError;
pub use http_store::HttpConfigStore;
pub use types::{CreateConfigPayload, EntityKind, EntityRef, HostView, Paged};
