//! Schema Interpreter
//!
//! Walks a schema tree and a configuration document together and produces
//! the flat, ordered field list the form layer renders. The interpreter is a
//! pure function of `(schema, document, attributes)`: callers re-run it
//! whenever an attribute flips and get recomputed visibility for the whole
//! tree.
//!
//! # Recovery Semantics
//!
//! A document value whose shape does not match its schema node is never
//! fatal: the interpreter substitutes the node's `nullValue` sentinel for
//! that field, flags it `was_reset`, and logs a warning so the form layer
//! can tell the user the field fell back to its default.

use crate::models::{
    ConfigurationAttributes, ConfigurationDocument, FieldPath, SchemaKind, SchemaNode,
};
use serde_json::Value;
use tracing::warn;

/// Editor widget class of a render field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Free-form JSON (object schema with no declared children)
    Json,
}

/// One enum choice with its optional display label
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    pub value: Value,
    pub label: Option<String>,
}

/// One renderable field, in schema-declared order
///
/// Exactly one render field is produced per schema leaf; arrays expand to
/// one field per current document element.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub path: FieldPath,
    pub kind: FieldKind,
    /// Display name: schema `title` or the field's own key
    pub title: String,
    pub description: Option<String>,
    pub value: Value,
    pub is_visible: bool,
    pub is_editable: bool,
    pub is_secret: bool,
    pub is_advanced: bool,
    pub is_multiline: bool,
    /// The document value did not match the schema and was replaced by the
    /// node's `nullValue`
    pub was_reset: bool,
    /// Nearest enclosing activation/synchronization group, if any
    pub group: Option<FieldPath>,
    /// Sentinel written when the field is cleared
    pub null_value: Value,
    /// Whether the field is nullable (`oneOf` with a null variant)
    pub can_clear: bool,
    /// Advisory editor hints, not validated
    pub suggestions: Vec<String>,
    pub enum_options: Vec<EnumOption>,
}

/// Project `(schema, document, attributes)` into the ordered field list
pub fn render_fields(
    schema: &SchemaNode,
    document: &ConfigurationDocument,
    attributes: &ConfigurationAttributes,
) -> Vec<RenderField> {
    let mut walker = Walker {
        attributes,
        out: Vec::new(),
    };
    walker.walk(
        schema,
        Some(document.root()),
        &FieldPath::root(),
        Scope::default(),
    );
    walker.out
}

/// Ancestor-derived state carried down the traversal
#[derive(Debug, Clone, Default)]
struct Scope {
    /// Nearest enclosing group path (ancestor or self)
    group: Option<FieldPath>,
    /// A strict ancestor group is inactive and does not keep its children
    /// shown
    hidden: bool,
    /// Some enclosing group is inactive: fields are disabled, data kept
    disabled: bool,
    /// A structural mismatch above reset this subtree to defaults
    reset: bool,
}

struct Walker<'a> {
    attributes: &'a ConfigurationAttributes,
    out: Vec<RenderField>,
}

impl Walker<'_> {
    fn walk(&mut self, node: &SchemaNode, value: Option<&Value>, path: &FieldPath, scope: Scope) {
        // Structural mismatch recovery happens before anything else so the
        // rest of the walk sees a conforming value.
        let substituted;
        let (value, reset) = match value {
            Some(v) if !node.matches_shape(v) => {
                warn!(
                    path = %path, expected = node.kind.name(),
                    "document value does not match schema, reset to null value"
                );
                substituted = node.meta.null_value.clone();
                (Some(&substituted), true)
            }
            other => (other, scope.reset),
        };

        // A group node scopes its descendants; the group's own leaf (if the
        // group is itself a leaf field) hides whenever the group is
        // inactive, while descendants stay shown if `isShown` says so.
        let mut scope = Scope { reset, ..scope };
        let mut self_hidden = false;
        if node.meta.is_group() {
            if let Some(attrs) = self.attributes.get(path) {
                scope.group = Some(path.clone());
                if let Some(activation) = &node.meta.activation {
                    if !attrs.is_active {
                        self_hidden = true;
                        scope.disabled = true;
                        if !activation.is_shown {
                            scope.hidden = true;
                        }
                    }
                }
            }
        }

        match &node.kind {
            SchemaKind::Object { children } if !children.is_empty() => {
                for (name, child) in children {
                    let child_value = value
                        .and_then(|v| v.as_object())
                        .and_then(|map| map.get(name));
                    self.walk(child, child_value, &path.clone().key(name.clone()), scope.clone());
                }
            }
            SchemaKind::Object { .. } => {
                self.emit(node, FieldKind::Json, value, path, &scope, self_hidden);
            }
            SchemaKind::Array { item } => {
                if let Some(items) = value.and_then(|v| v.as_array()) {
                    for (idx, element) in items.iter().enumerate() {
                        self.walk(item, Some(element), &path.clone().index(idx), scope.clone());
                    }
                }
            }
            SchemaKind::OneOf { variants } => {
                self.walk_one_of(node, variants, value, path, scope, self_hidden);
            }
            SchemaKind::String => {
                self.emit(node, FieldKind::String, value, path, &scope, self_hidden)
            }
            SchemaKind::Number => {
                self.emit(node, FieldKind::Number, value, path, &scope, self_hidden)
            }
            SchemaKind::Integer => {
                self.emit(node, FieldKind::Integer, value, path, &scope, self_hidden)
            }
            SchemaKind::Boolean => {
                self.emit(node, FieldKind::Boolean, value, path, &scope, self_hidden)
            }
            SchemaKind::Null => self.emit(node, FieldKind::Null, value, path, &scope, self_hidden),
        }
    }

    /// Select the `oneOf` variant matching the current value's shape. A
    /// cleared value edits through the first non-null variant while keeping
    /// the node's own `nullValue` sentinel as the displayed value.
    fn walk_one_of(
        &mut self,
        node: &SchemaNode,
        variants: &[SchemaNode],
        value: Option<&Value>,
        path: &FieldPath,
        scope: Scope,
        self_hidden: bool,
    ) {
        let cleared = match value {
            None => true,
            Some(v) => v.is_null() || *v == node.meta.null_value,
        };

        let selected = if cleared {
            variants
                .iter()
                .find(|v| !matches!(v.kind, SchemaKind::Null))
                .unwrap_or(&variants[0])
        } else {
            let current = value.unwrap_or(&Value::Null);
            match variants.iter().find(|v| v.matches_shape(current)) {
                Some(variant) => variant,
                None => {
                    // No variant matches: same recovery as any structural
                    // mismatch, degrade to the cleared state.
                    warn!(
                        path = %path,
                        "no oneOf variant matches document value, reset to null value"
                    );
                    return self.walk_one_of(
                        node,
                        variants,
                        None,
                        path,
                        Scope { reset: true, ..scope },
                        self_hidden,
                    );
                }
            }
        };

        match &selected.kind {
            SchemaKind::Object { .. } | SchemaKind::Array { .. } => {
                let inner = if cleared { None } else { value };
                self.walk(selected, inner, path, scope);
            }
            _ => {
                let kind = match &selected.kind {
                    SchemaKind::String => FieldKind::String,
                    SchemaKind::Number => FieldKind::Number,
                    SchemaKind::Integer => FieldKind::Integer,
                    SchemaKind::Boolean => FieldKind::Boolean,
                    _ => FieldKind::Null,
                };
                let shown_value = if cleared { None } else { value };
                let mut field = self.build_field(node, kind, shown_value, path, &scope, self_hidden);
                field.can_clear = variants
                    .iter()
                    .any(|v| matches!(v.kind, SchemaKind::Null));
                self.out.push(field);
            }
        }
    }

    fn emit(
        &mut self,
        node: &SchemaNode,
        kind: FieldKind,
        value: Option<&Value>,
        path: &FieldPath,
        scope: &Scope,
        self_hidden: bool,
    ) {
        let field = self.build_field(node, kind, value, path, scope, self_hidden);
        self.out.push(field);
    }

    fn build_field(
        &self,
        node: &SchemaNode,
        kind: FieldKind,
        value: Option<&Value>,
        path: &FieldPath,
        scope: &Scope,
        self_hidden: bool,
    ) -> RenderField {
        let meta = &node.meta;
        let value = match value {
            Some(v) => v.clone(),
            None => meta
                .default
                .clone()
                .unwrap_or_else(|| meta.null_value.clone()),
        };

        let title = meta.title.clone().unwrap_or_else(|| {
            path.last()
                .map(|s| s.to_string())
                .unwrap_or_default()
        });

        let enum_options = meta
            .enum_values
            .as_ref()
            .map(|values| {
                let labels = meta.enum_extra.as_ref().map(|e| e.labels.as_slice());
                values
                    .iter()
                    .enumerate()
                    .map(|(idx, v)| EnumOption {
                        value: v.clone(),
                        label: labels.and_then(|l| l.get(idx)).cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (suggestions, is_multiline) = match &meta.string_extra {
            Some(extra) => (extra.suggestions.clone(), extra.is_multiline),
            None => (Vec::new(), false),
        };

        RenderField {
            path: path.clone(),
            kind,
            title,
            description: meta.description.clone(),
            value,
            is_visible: !meta.is_invisible && !scope.hidden && !self_hidden,
            is_editable: !meta.read_only && !scope.disabled && kind != FieldKind::Null,
            is_secret: meta.is_secret,
            is_advanced: meta.is_advanced,
            is_multiline,
            was_reset: scope.reset,
            group: scope.group.clone(),
            null_value: meta.null_value.clone(),
            can_clear: false,
            suggestions,
            enum_options,
        }
    }
}

#[cfg(test)]
#[path = "interpreter_test.rs"]
mod interpreter_test;
