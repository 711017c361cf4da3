//! Field Paths
//!
//! A `FieldPath` addresses a single field inside a configuration document as
//! an ordered sequence of segment tokens. Paths are kept structured in memory
//! and only rendered to their `/`-joined string form at the management API
//! boundary (attribute maps are keyed by that string form on the wire).
//!
//! # Examples
//!
//! ```rust
//! use clusterhub_config::models::FieldPath;
//!
//! let path = FieldPath::root().key("logrotate").key("size");
//! assert_eq!(path.to_api_string(), "logrotate/size");
//!
//! let parsed = FieldPath::from_api_string("logrotate/size").unwrap();
//! assert_eq!(parsed, path);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when constructing or parsing field paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path string contained an empty segment ("a//b" or leading/trailing "/")
    #[error("Empty segment in path: {0}")]
    EmptySegment(String),

    /// A property name contains the segment separator and cannot be addressed
    #[error("Property name contains '/': {0}")]
    SeparatorInName(String),
}

/// One token of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object property name
    Key(String),
    /// Array element position
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(name) => write!(f, "{name}"),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Structured address of a field within a configuration document
///
/// The root path (no segments) addresses the whole document. Group paths in
/// attribute maps always consist of `Key` segments only, since activation and
/// synchronization groups are object subtrees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path addressing the document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from pre-tokenized segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Extend with an object property segment
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(name.into()));
        self
    }

    /// Extend with an array index segment
    pub fn index(mut self, idx: usize) -> Self {
        self.0.push(PathSegment::Index(idx));
        self
    }

    /// Whether this is the root path
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments (same as [`FieldPath::is_root`])
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the segment tokens
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The last segment, if any
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Parent path (root's parent is `None`)
    pub fn parent(&self) -> Option<FieldPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(FieldPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Whether `self` is `other` or a descendant of `other`
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }

    /// Render the `/`-joined wire form used by attribute map keys
    pub fn to_api_string(&self) -> String {
        self.0
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parse the `/`-joined wire form
    ///
    /// All segments parse as `Key` tokens: attribute maps only ever address
    /// object subtrees, so index segments never occur in wire-form paths.
    /// An empty string parses as the root path.
    pub fn from_api_string(raw: &str) -> Result<FieldPath, PathError> {
        if raw.is_empty() {
            return Ok(FieldPath::root());
        }
        let mut segments = Vec::new();
        for part in raw.split('/') {
            if part.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            segments.push(PathSegment::Key(part.to_string()));
        }
        Ok(FieldPath(segments))
    }
}

/// `Display` delegates to the wire form so paths read naturally in logs and
/// error messages.
impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_api_string())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_api_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::from_api_string(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_render() {
        let path = FieldPath::root().key("cluster").key("logrotate").index(2);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_api_string(), "cluster/logrotate/2");
        assert_eq!(path.to_string(), "cluster/logrotate/2");
    }

    #[test]
    fn test_parse_round_trip() {
        let path = FieldPath::from_api_string("audit/rotation/size").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("audit".to_string()),
                PathSegment::Key("rotation".to_string()),
                PathSegment::Key("size".to_string()),
            ]
        );
        assert_eq!(path.to_api_string(), "audit/rotation/size");
    }

    #[test]
    fn test_parse_root() {
        let path = FieldPath::from_api_string("").unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_api_string(), "");
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(matches!(
            FieldPath::from_api_string("a//b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            FieldPath::from_api_string("/a"),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_parent_and_prefix() {
        let path = FieldPath::root().key("a").key("b");
        assert_eq!(path.parent(), Some(FieldPath::root().key("a")));
        assert_eq!(FieldPath::root().parent(), None);

        assert!(path.starts_with(&FieldPath::root().key("a")));
        assert!(path.starts_with(&path));
        assert!(!FieldPath::root().key("a").starts_with(&path));
    }
}
