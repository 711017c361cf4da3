//! Configuration Document Model
//!
//! The editable value tree of a configuration: a JSON-compatible nested
//! structure whose shape must match its associated schema. Mutation happens
//! only through path-addressed updates that validate the replacement subtree
//! against the schema first, so the document is never partially invalid
//! mid-edit.

use crate::models::path::{FieldPath, PathSegment};
use crate::models::schema::{SchemaKind, SchemaNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced by path-addressed document updates
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The path does not resolve to a schema node
    #[error("Path does not exist in schema: {path}")]
    UnknownPath { path: String },

    /// The replacement value does not conform to the schema subtree
    #[error("Value for '{path}' does not conform to schema node '{kind}'")]
    ShapeMismatch { path: String, kind: &'static str },

    /// The path's parent container is missing or of the wrong shape
    #[error("Cannot address '{path}': parent container missing or not a container")]
    ParentMissing { path: String },

    /// Array index out of bounds (appending at `len` is allowed)
    #[error("Array index {index} out of bounds at '{path}'")]
    IndexOutOfBounds { path: String, index: usize },
}

/// The editable configuration value tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationDocument {
    root: Value,
}

impl ConfigurationDocument {
    /// Wrap an existing value tree (e.g. a revision payload)
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Build a fresh document from a schema's declared defaults
    ///
    /// Leaves take their `default` if declared, otherwise their `nullValue`
    /// sentinel. Objects materialize all declared children; free-form
    /// objects and arrays take their default/sentinel as a whole.
    pub fn from_schema_defaults(schema: &SchemaNode) -> Self {
        Self {
            root: default_value(schema),
        }
    }

    /// Borrow the whole tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume into the raw value tree
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Read the value at `path`, if present
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = match segment {
                PathSegment::Key(name) => node.as_object()?.get(name)?,
                PathSegment::Index(idx) => node.as_array()?.get(*idx)?,
            };
        }
        Some(node)
    }

    /// Replace the subtree at `path` with `value`
    ///
    /// The replacement is validated against the schema subtree first; a
    /// non-conforming value is rejected whole and the document is left
    /// untouched. Setting a key on an existing object inserts it; setting
    /// index `len` on an array appends.
    ///
    /// # Errors
    ///
    /// - `UnknownPath`: `path` does not resolve inside `schema`
    /// - `ShapeMismatch`: `value` does not conform to the schema subtree
    /// - `ParentMissing`: the parent container is absent or not a container
    /// - `IndexOutOfBounds`: array index past the append position
    pub fn set(
        &mut self,
        schema: &SchemaNode,
        path: &FieldPath,
        value: Value,
    ) -> Result<(), DocumentError> {
        let target = schema.resolve(path).ok_or_else(|| DocumentError::UnknownPath {
            path: path.to_api_string(),
        })?;
        if !target.conforms(&value) {
            return Err(DocumentError::ShapeMismatch {
                path: path.to_api_string(),
                kind: target.kind.name(),
            });
        }

        if path.is_root() {
            self.root = value;
            return Ok(());
        }

        let parent_path = path.parent().unwrap_or_default();
        let parent = navigate_mut(&mut self.root, &parent_path).ok_or_else(|| {
            DocumentError::ParentMissing {
                path: path.to_api_string(),
            }
        })?;

        match path.last() {
            Some(PathSegment::Key(name)) => {
                let map = parent
                    .as_object_mut()
                    .ok_or_else(|| DocumentError::ParentMissing {
                        path: path.to_api_string(),
                    })?;
                map.insert(name.clone(), value);
            }
            Some(PathSegment::Index(idx)) => {
                let items = parent
                    .as_array_mut()
                    .ok_or_else(|| DocumentError::ParentMissing {
                        path: path.to_api_string(),
                    })?;
                match (*idx).cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[*idx] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(DocumentError::IndexOutOfBounds {
                            path: path.to_api_string(),
                            index: *idx,
                        })
                    }
                }
            }
            None => unreachable!("non-root path has a last segment"),
        }
        Ok(())
    }

    /// Clear the field at `path` back to its schema node's `nullValue`
    /// sentinel, preserving the exact sentinel declared in the schema.
    pub fn clear(&mut self, schema: &SchemaNode, path: &FieldPath) -> Result<(), DocumentError> {
        let target = schema.resolve(path).ok_or_else(|| DocumentError::UnknownPath {
            path: path.to_api_string(),
        })?;
        let sentinel = target.meta.null_value.clone();
        self.set(schema, path, sentinel)
    }
}

fn navigate_mut<'a>(root: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in path.segments() {
        node = match segment {
            PathSegment::Key(name) => node.as_object_mut()?.get_mut(name)?,
            PathSegment::Index(idx) => node.as_array_mut()?.get_mut(*idx)?,
        };
    }
    Some(node)
}

fn default_value(schema: &SchemaNode) -> Value {
    if let Some(default) = &schema.meta.default {
        return default.clone();
    }
    match &schema.kind {
        SchemaKind::Object { children } if !children.is_empty() => {
            let mut map = Map::new();
            for (name, child) in children {
                map.insert(name.clone(), default_value(child));
            }
            Value::Object(map)
        }
        _ => schema.meta.null_value.clone(),
    }
}
