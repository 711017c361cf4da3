//! Configuration Schema Model
//!
//! This module defines the typed representation of a server-supplied
//! configuration schema: a recursive JSON-Schema-like tree where every node
//! carries an `adcmMeta` extension object with edit-behavior metadata
//! (activation/synchronization groups, secrecy, advanced/invisible flags,
//! the "cleared" sentinel value, string suggestions, enum labels).
//!
//! # Architecture
//!
//! - **Closed kind dispatch**: node kinds are a tagged union, matched
//!   exhaustively, instead of a stringly `type` field.
//! - **Order preservation**: object children keep the declared property
//!   order, which is also the render order.
//! - **Sentinel fidelity**: each node's `nullValue` is preserved exactly as
//!   authored (`{}`, `[]`, or `null` are distinct sentinels).
//!
//! # Example Wire Payload
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "logrotate": {
//!       "type": "object",
//!       "adcmMeta": {
//!         "activation": {"isShown": true, "isAllowChange": true},
//!         "nullValue": {}
//!       },
//!       "properties": {
//!         "size": {"type": "string", "adcmMeta": {"nullValue": null}}
//!       }
//!     }
//!   }
//! }
//! ```

use crate::models::path::{FieldPath, PathSegment};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors produced while parsing or validating a schema tree
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The payload is not a structurally valid schema
    #[error("Invalid schema payload: {0}")]
    InvalidPayload(String),

    /// Unknown `type` keyword value
    #[error("Unknown schema type: {0}")]
    UnknownKind(String),

    /// A property name contains the path separator
    #[error("Property name contains '/': {0}")]
    InvalidPropertyName(String),

    /// A node's `nullValue` is not assignable to its declared type
    #[error("Null value {value} is not assignable to {kind} node at '{path}'")]
    InvalidNullValue {
        path: String,
        kind: &'static str,
        value: Value,
    },

    /// A `oneOf` node declared no variants
    #[error("oneOf node at '{path}' has no variants")]
    EmptyOneOf { path: String },
}

/// Visibility/mutability rule for an activation or synchronization group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRule {
    /// Whether the group's fields stay shown while the group is inactive
    /// (activation) or inherited (synchronization)
    pub is_shown: bool,
    /// Whether the flag may be toggled at all
    pub is_allow_change: bool,
}

/// Advisory metadata for string fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringExtra {
    /// Suggested values offered by the editor, not validated
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Render as a multiline editor
    #[serde(default)]
    pub is_multiline: bool,
}

/// Display labels for enum values, positionally matched to `enum`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumExtra {
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Edit-behavior metadata attached to every schema node
///
/// `activation` and `synchronization` being non-null is what makes a node a
/// *group*: the subtree can be toggled active/inactive (activation) or marked
/// as locally overridden vs. inherited (synchronization) as a unit.
#[derive(Debug, Clone, Default)]
pub struct SchemaMeta {
    /// Display name (JSON Schema `title`)
    pub title: Option<String>,
    /// Help text (JSON Schema `description`)
    pub description: Option<String>,
    /// Hidden behind the "advanced" editor toggle
    pub is_advanced: bool,
    /// Never rendered
    pub is_invisible: bool,
    /// Value is masked in the editor and logs
    pub is_secret: bool,
    /// Field is read-only regardless of attributes
    pub read_only: bool,
    /// Activation group rule, if this node is an activation group
    pub activation: Option<GroupRule>,
    /// Synchronization group rule, if this node is a synchronization group
    pub synchronization: Option<GroupRule>,
    /// The sentinel written when the field is cleared; preserved exactly as
    /// authored
    pub null_value: Value,
    /// Declared default value (JSON Schema `default`)
    pub default: Option<Value>,
    /// Allowed values (JSON Schema `enum`)
    pub enum_values: Option<Vec<Value>>,
    /// String editor hints
    pub string_extra: Option<StringExtra>,
    /// Enum display labels
    pub enum_extra: Option<EnumExtra>,
}

impl SchemaMeta {
    /// Whether this node is an activation or synchronization group
    pub fn is_group(&self) -> bool {
        self.activation.is_some() || self.synchronization.is_some()
    }
}

/// Kind of a schema node, a closed tagged union
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Object with ordered, uniquely named children. An object with no
    /// declared children is a free-form JSON leaf.
    Object {
        children: IndexMap<String, SchemaNode>,
    },
    /// Homogeneous array
    Array { item: Box<SchemaNode> },
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Alternative shapes, used to express "field or null" (nullable fields)
    OneOf { variants: Vec<SchemaNode> },
}

impl SchemaKind {
    /// Keyword name of the kind, for error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::OneOf { .. } => "oneOf",
        }
    }
}

/// One node of the recursive configuration schema tree
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub meta: SchemaMeta,
}

impl SchemaNode {
    /// Parse a wire-format schema (JSON Schema + `adcmMeta`) into the typed
    /// tree, validating structural invariants.
    ///
    /// # Errors
    ///
    /// - `InvalidPayload`: the value is not a schema object
    /// - `UnknownKind`: unsupported `type` keyword
    /// - `InvalidPropertyName`: a property name contains `/`
    /// - `InvalidNullValue`: a leaf's `nullValue` is neither assignable to
    ///   its declared type nor structurally empty
    /// - `EmptyOneOf`: a `oneOf` node with no variants
    pub fn parse(value: Value) -> Result<SchemaNode, SchemaError> {
        let raw: RawSchema = serde_json::from_value(value)
            .map_err(|e| SchemaError::InvalidPayload(e.to_string()))?;
        let node = raw.into_node(&FieldPath::root())?;
        node.validate(&FieldPath::root())?;
        Ok(node)
    }

    // ------------------------------------------------------------------
    // Builders (used heavily in tests and by embedding consumers)
    // ------------------------------------------------------------------

    pub fn object(children: impl IntoIterator<Item = (String, SchemaNode)>) -> Self {
        Self {
            kind: SchemaKind::Object {
                children: children.into_iter().collect(),
            },
            meta: SchemaMeta::default(),
        }
    }

    pub fn array(item: SchemaNode) -> Self {
        Self {
            kind: SchemaKind::Array {
                item: Box::new(item),
            },
            meta: SchemaMeta::default(),
        }
    }

    pub fn string() -> Self {
        Self {
            kind: SchemaKind::String,
            meta: SchemaMeta::default(),
        }
    }

    pub fn number() -> Self {
        Self {
            kind: SchemaKind::Number,
            meta: SchemaMeta::default(),
        }
    }

    pub fn integer() -> Self {
        Self {
            kind: SchemaKind::Integer,
            meta: SchemaMeta::default(),
        }
    }

    pub fn boolean() -> Self {
        Self {
            kind: SchemaKind::Boolean,
            meta: SchemaMeta::default(),
        }
    }

    pub fn null() -> Self {
        Self {
            kind: SchemaKind::Null,
            meta: SchemaMeta::default(),
        }
    }

    pub fn one_of(variants: Vec<SchemaNode>) -> Self {
        Self {
            kind: SchemaKind::OneOf { variants },
            meta: SchemaMeta::default(),
        }
    }

    /// Replace the node's metadata, builder-style
    pub fn with_meta(mut self, meta: SchemaMeta) -> Self {
        self.meta = meta;
        self
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Resolve the schema node addressed by `path`
    ///
    /// `oneOf` nodes are looked through: a key segment resolves into the
    /// first variant that declares that property, an index segment into the
    /// first array variant.
    pub fn resolve(&self, path: &FieldPath) -> Option<&SchemaNode> {
        let mut node = self;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        Some(node)
    }

    fn child(&self, segment: &PathSegment) -> Option<&SchemaNode> {
        match (&self.kind, segment) {
            (SchemaKind::Object { children }, PathSegment::Key(name)) => children.get(name),
            (SchemaKind::Array { item }, PathSegment::Index(_)) => Some(item),
            (SchemaKind::OneOf { variants }, _) => {
                variants.iter().find_map(|v| v.child(segment))
            }
            _ => None,
        }
    }

    /// Collect the paths of all activation/synchronization groups, in
    /// declared order. These are exactly the keys a conforming attribute map
    /// must carry.
    pub fn group_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        self.collect_group_paths(&FieldPath::root(), &mut out);
        out
    }

    fn collect_group_paths(&self, path: &FieldPath, out: &mut Vec<FieldPath>) {
        if self.meta.is_group() {
            out.push(path.clone());
        }
        match &self.kind {
            SchemaKind::Object { children } => {
                for (name, child) in children {
                    child.collect_group_paths(&path.clone().key(name.clone()), out);
                }
            }
            SchemaKind::OneOf { variants } => {
                // Group metadata sits on the oneOf node itself; variants
                // share the node's path.
                for variant in variants {
                    variant.collect_group_paths(path, out);
                }
            }
            _ => {}
        }
    }

    /// Shallow shape check: does `value` match this node's kind?
    ///
    /// The node's own `nullValue` sentinel always matches, so a cleared
    /// field is never reported as a structural mismatch.
    pub fn matches_shape(&self, value: &Value) -> bool {
        if *value == self.meta.null_value {
            return true;
        }
        match &self.kind {
            SchemaKind::Object { .. } => value.is_object(),
            SchemaKind::Array { .. } => value.is_array(),
            SchemaKind::String => value.is_string(),
            SchemaKind::Number => value.is_number(),
            SchemaKind::Integer => value.is_i64() || value.is_u64(),
            SchemaKind::Boolean => value.is_boolean(),
            SchemaKind::Null => value.is_null(),
            SchemaKind::OneOf { variants } => variants.iter().any(|v| v.matches_shape(value)),
        }
    }

    /// Deep conformance check: does `value` structurally conform to this
    /// subtree? Object values may omit declared keys but must not carry
    /// undeclared ones (free-form objects excepted).
    pub fn conforms(&self, value: &Value) -> bool {
        if *value == self.meta.null_value {
            return true;
        }
        match &self.kind {
            SchemaKind::Object { children } => {
                if children.is_empty() {
                    // Free-form JSON leaf
                    return value.is_object();
                }
                match value.as_object() {
                    Some(map) => map.iter().all(|(key, child_value)| {
                        children
                            .get(key)
                            .map(|child| child.conforms(child_value))
                            .unwrap_or(false)
                    }),
                    None => false,
                }
            }
            SchemaKind::Array { item } => match value.as_array() {
                Some(items) => items.iter().all(|v| item.conforms(v)),
                None => false,
            },
            SchemaKind::OneOf { variants } => variants.iter().any(|v| v.conforms(value)),
            _ => self.matches_shape(value),
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate(&self, path: &FieldPath) -> Result<(), SchemaError> {
        if !null_value_assignable(&self.kind, &self.meta.null_value) {
            return Err(SchemaError::InvalidNullValue {
                path: path.to_api_string(),
                kind: self.kind.name(),
                value: self.meta.null_value.clone(),
            });
        }
        match &self.kind {
            SchemaKind::Object { children } => {
                for (name, child) in children {
                    if name.contains('/') {
                        return Err(SchemaError::InvalidPropertyName(name.clone()));
                    }
                    child.validate(&path.clone().key(name.clone()))?;
                }
                Ok(())
            }
            SchemaKind::Array { item } => item.validate(&path.clone().index(0)),
            SchemaKind::OneOf { variants } => {
                if variants.is_empty() {
                    return Err(SchemaError::EmptyOneOf {
                        path: path.to_api_string(),
                    });
                }
                for variant in variants {
                    variant.validate(path)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// A `nullValue` is valid when assignable to the declared type or
/// structurally empty (`{}`, `[]`, `null`).
fn null_value_assignable(kind: &SchemaKind, value: &Value) -> bool {
    let structurally_empty = value.is_null()
        || value.as_object().map(|m| m.is_empty()).unwrap_or(false)
        || value.as_array().map(|a| a.is_empty()).unwrap_or(false);
    if structurally_empty {
        return true;
    }
    match kind {
        SchemaKind::Object { .. } => value.is_object(),
        SchemaKind::Array { .. } => value.is_array(),
        SchemaKind::String => value.is_string(),
        SchemaKind::Number => value.is_number(),
        SchemaKind::Integer => value.is_i64() || value.is_u64(),
        SchemaKind::Boolean => value.is_boolean(),
        SchemaKind::Null => false,
        SchemaKind::OneOf { variants } => {
            variants.iter().any(|v| null_value_assignable(&v.kind, value))
        }
    }
}

// ----------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------

/// Raw JSON Schema node as served by the management API
#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    properties: IndexMap<String, RawSchema>,
    items: Option<Box<RawSchema>>,
    #[serde(rename = "oneOf")]
    one_of: Option<Vec<RawSchema>>,
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "readOnly", default)]
    read_only: bool,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<Value>>,
    default: Option<Value>,
    #[serde(rename = "adcmMeta", default)]
    meta: RawMeta,
}

/// The `adcmMeta` extension object
#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(rename = "isAdvanced", default)]
    is_advanced: bool,
    #[serde(rename = "isInvisible", default)]
    is_invisible: bool,
    #[serde(rename = "isSecret", default)]
    is_secret: bool,
    activation: Option<GroupRule>,
    synchronization: Option<GroupRule>,
    #[serde(rename = "nullValue")]
    null_value: Option<Value>,
    #[serde(rename = "stringExtra")]
    string_extra: Option<StringExtra>,
    #[serde(rename = "enumExtra")]
    enum_extra: Option<EnumExtra>,
}

impl RawSchema {
    fn into_node(self, path: &FieldPath) -> Result<SchemaNode, SchemaError> {
        let meta = SchemaMeta {
            title: self.title,
            description: self.description,
            is_advanced: self.meta.is_advanced,
            is_invisible: self.meta.is_invisible,
            is_secret: self.meta.is_secret,
            read_only: self.read_only,
            activation: self.meta.activation,
            synchronization: self.meta.synchronization,
            null_value: self.meta.null_value.unwrap_or(Value::Null),
            default: self.default,
            enum_values: self.enum_values,
            string_extra: self.meta.string_extra,
            enum_extra: self.meta.enum_extra,
        };

        if let Some(variants) = self.one_of {
            let variants = variants
                .into_iter()
                .map(|raw| raw.into_node(path))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(SchemaNode {
                kind: SchemaKind::OneOf { variants },
                meta,
            });
        }

        let kind = match self.kind.as_deref() {
            Some("object") | None => {
                let mut children = IndexMap::new();
                for (name, raw) in self.properties {
                    let child = raw.into_node(&path.clone().key(name.clone()))?;
                    children.insert(name, child);
                }
                SchemaKind::Object { children }
            }
            Some("array") => {
                let raw_item = self.items.ok_or_else(|| {
                    SchemaError::InvalidPayload(format!(
                        "array node at '{}' has no items schema",
                        path.to_api_string()
                    ))
                })?;
                SchemaKind::Array {
                    item: Box::new(raw_item.into_node(&path.clone().index(0))?),
                }
            }
            Some("string") => SchemaKind::String,
            Some("number") => SchemaKind::Number,
            Some("integer") => SchemaKind::Integer,
            Some("boolean") => SchemaKind::Boolean,
            Some("null") => SchemaKind::Null,
            Some(other) => return Err(SchemaError::UnknownKind(other.to_string())),
        };

        Ok(SchemaNode { kind, meta })
    }
}
