//! Compiled schema graph.
//!
//! Nodes live in an arena owned by [`SchemaGraph`] and point at each other
//! through [`SchemaId`] indices, so reference cycles are plain data. A
//! [`CompiledSchema`] is a cheap, thread-safe handle on a graph plus the id of
//! its root.

use crate::content::{ContentEncoding, MediaType};
use crate::validator::Validator;
use crate::vocab::Extension;
use crate::{CompilerOptions, Draft, ErrorKind, ValidationError};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use regex::Regex;
use schema_core::{InstanceLocation, TypeSet, Value};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

/// Index of a node in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// `additionalProperties` / `additionalItems`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Additional {
    Bool(bool),
    Schema(SchemaId),
}

/// `items` before 2020-12.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    /// Every element against one schema
    Schema(SchemaId),
    /// Positional schemas
    Tuple(Vec<SchemaId>),
}

/// Value of a `dependencies` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Required(Vec<String>),
    Schema(SchemaId),
}

/// `enum` together with the type tags of its members, used as a prefilter.
#[derive(Debug, Clone)]
pub struct Enum {
    pub values: Vec<Value>,
    /// `None` when a member is a custom value, whose projection may be of any kind
    pub types: Option<TypeSet>,
}

impl Enum {
    pub fn new(values: Vec<Value>) -> Self {
        let types = if values.iter().any(|v| matches!(v, Value::Custom(_))) {
            None
        } else {
            Some(values.iter().filter_map(Value::type_tag).collect())
        };
        Self { values, types }
    }

    /// False when no member can equal a value of this kind.
    pub fn may_contain(&self, v: &Value) -> bool {
        match (&self.types, v) {
            (None, _) | (_, Value::Custom(_)) => true,
            (Some(types), v) => v.type_tag().is_some_and(|tag| types.contains(tag)),
        }
    }
}

/// Statically resolved `$dynamicRef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRef {
    /// Target when no dynamic anchor applies
    pub target: SchemaId,
    /// Anchor name, present only when the static target declares it as a dynamic anchor
    pub anchor: Option<String>,
}

/// One compiled schema node.
///
/// Absent keywords are `None`, empty collections or `false`; an empty
/// `types` set is distinct from an absent one.
#[derive(Debug, Default)]
pub struct Schema {
    /// Canonical location: document URL, `#`, JSON pointer
    pub location: String,
    pub draft: Draft,
    pub(crate) resource: SchemaId,
    pub(crate) dynamic_anchors: HashMap<String, SchemaId>,

    /// Set for `true`/`false` schemas; all other fields are then empty
    pub boolean: Option<bool>,
    pub id: Option<String>,
    pub anchor: Option<String>,
    pub reference: Option<SchemaId>,
    pub recursive_ref: Option<SchemaId>,
    pub recursive_anchor: bool,
    pub dynamic_ref: Option<DynamicRef>,
    pub dynamic_anchor: Option<String>,

    pub types: Option<TypeSet>,
    pub enumeration: Option<Enum>,
    pub constant: Option<Value>,
    pub not: Option<SchemaId>,
    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub if_schema: Option<SchemaId>,
    pub then_schema: Option<SchemaId>,
    pub else_schema: Option<SchemaId>,

    pub min_properties: Option<usize>,
    pub max_properties: Option<usize>,
    pub required: Vec<String>,
    pub property_names: Option<SchemaId>,
    pub properties: IndexMap<String, SchemaId>,
    pub pattern_properties: Vec<(Regex, SchemaId)>,
    pub additional_properties: Option<Additional>,
    pub dependencies: IndexMap<String, Dependency>,
    pub dependent_required: IndexMap<String, Vec<String>>,
    pub dependent_schemas: IndexMap<String, SchemaId>,
    pub unevaluated_properties: Option<SchemaId>,

    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
    pub contains: Option<SchemaId>,
    pub min_contains: Option<usize>,
    pub max_contains: Option<usize>,
    pub items: Option<Items>,
    pub additional_items: Option<Additional>,
    pub prefix_items: Vec<SchemaId>,
    /// `items` in 2020-12: applies after `prefixItems`
    pub rest_items: Option<SchemaId>,
    pub unevaluated_items: Option<SchemaId>,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub content_encoding: Option<ContentEncoding>,
    pub content_media_type: Option<MediaType>,
    pub content_schema: Option<SchemaId>,

    pub minimum: Option<BigDecimal>,
    pub maximum: Option<BigDecimal>,
    pub exclusive_minimum: Option<BigDecimal>,
    pub exclusive_maximum: Option<BigDecimal>,
    pub multiple_of: Option<BigDecimal>,

    pub extensions: Vec<Box<dyn Extension>>,

    pub format: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub comment: Option<String>,
    pub read_only: bool,
    pub write_only: bool,
    pub deprecated: bool,
    pub examples: Vec<Value>,
    /// Ordinal annotation (`order`), used to sort properties
    pub order: Option<BigDecimal>,
}

impl Schema {
    /// Creates an empty node; the compiler fills in keywords afterwards.
    pub(crate) fn new(location: String, draft: Draft, resource: SchemaId) -> Self {
        Self {
            location,
            draft,
            resource,
            ..Self::default()
        }
    }
}

/// Arena of compiled nodes.
#[derive(Debug)]
pub struct SchemaGraph {
    pub(crate) nodes: Vec<Schema>,
    pub(crate) options: CompilerOptions,
}

impl SchemaGraph {
    pub(crate) fn new(nodes: Vec<Schema>, options: CompilerOptions) -> Self {
        Self { nodes, options }
    }

    /// Returns the node with the given id.
    pub fn get(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0]
    }

    /// Finds a node by canonical location.
    pub fn find(&self, location: &str) -> Option<SchemaId> {
        self.nodes
            .iter()
            .position(|node| node.location == location)
            .map(SchemaId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Settings the graph was compiled with.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }
}

/// Immutable, shareable result of a compilation.
///
/// Cloning is cheap and the handle can be sent to other threads; any number
/// of validations may run on it concurrently.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    graph: Arc<SchemaGraph>,
    root: SchemaId,
}

impl CompiledSchema {
    pub(crate) fn new(graph: SchemaGraph, root: SchemaId) -> Self {
        Self {
            graph: Arc::new(graph),
            root,
        }
    }

    /// The root node.
    pub fn root(&self) -> SchemaNode<'_> {
        self.node(self.root)
    }

    /// Any node of the graph.
    pub fn node(&self, id: SchemaId) -> SchemaNode<'_> {
        SchemaNode {
            graph: &self.graph,
            id,
        }
    }

    /// Finds a node by canonical location, e.g. `file:///s.json#/properties/a`.
    pub fn find(&self, location: &str) -> Option<SchemaNode<'_>> {
        self.graph.find(location).map(|id| self.node(id))
    }

    /// Canonical location of the root.
    pub fn location(&self) -> &str {
        &self.graph.get(self.root).location
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Validates an instance.
    ///
    /// On failure the returned error has kind [`ErrorKind::Schema`] and its
    /// causes are the failing keywords of the root node.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        let mut validator = Validator::new(&self.graph);
        let root = InstanceLocation::root();
        match validator.validate(self.root, instance, &root) {
            Ok(_) => Ok(()),
            Err(err) => {
                let causes = match err.kind {
                    ErrorKind::Group => err.causes,
                    _ => vec![err],
                };
                let location = self.location().to_string();
                debug!(
                    "Validation against {} failed with {} error(s)",
                    location,
                    causes.len()
                );
                let kind = ErrorKind::Schema {
                    location: location.clone(),
                };
                Err(ValidationError::new(&location, &root, kind).with_causes(causes))
            }
        }
    }

    /// Returns true if the instance is valid.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_ok()
    }
}

/// Borrowed view of one node together with its graph.
///
/// Dereferences to [`Schema`]; the accessors below follow ids to other views.
#[derive(Clone, Copy)]
pub struct SchemaNode<'a> {
    graph: &'a SchemaGraph,
    id: SchemaId,
}

impl<'a> SchemaNode<'a> {
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// The node's data with the graph's lifetime.
    pub fn schema(&self) -> &'a Schema {
        self.graph.get(self.id)
    }

    /// Another node of the same graph.
    pub fn get(&self, id: SchemaId) -> SchemaNode<'a> {
        SchemaNode {
            graph: self.graph,
            id,
        }
    }

    /// Target of `$ref`.
    pub fn reference(&self) -> Option<SchemaNode<'a>> {
        self.schema().reference.map(|id| self.get(id))
    }

    pub fn all_of(self) -> impl Iterator<Item = SchemaNode<'a>> + 'a {
        let graph = self.graph;
        self.schema()
            .all_of
            .iter()
            .map(move |&id| SchemaNode { graph, id })
    }

    /// Declared properties in declaration order.
    pub fn properties(self) -> impl Iterator<Item = (&'a str, SchemaNode<'a>)> + 'a {
        let graph = self.graph;
        self.schema()
            .properties
            .iter()
            .map(move |(name, &id)| (name.as_str(), SchemaNode { graph, id }))
    }

    /// Schema applied to array elements: 2020-12 `items`, or a single-schema `items`.
    pub fn items(&self) -> Option<SchemaNode<'a>> {
        let schema = self.schema();
        let id = match (&schema.items, schema.rest_items) {
            (_, Some(id)) => id,
            (Some(Items::Schema(id)), None) => *id,
            _ => return None,
        };
        Some(self.get(id))
    }
}

impl Deref for SchemaNode<'_> {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        self.graph.get(self.id)
    }
}

impl fmt::Debug for SchemaNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaNode").field(&self.location).finish()
    }
}

impl PartialEq for SchemaNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph() -> SchemaGraph {
        let mut root = Schema::new("urn:t#".to_string(), Draft::V2020_12, SchemaId(0));
        root.properties.insert("a".to_string(), SchemaId(1));
        root.all_of.push(SchemaId(1));
        let mut child = Schema::new(
            "urn:t#/properties/a".to_string(),
            Draft::V2020_12,
            SchemaId(0),
        );
        child.boolean = Some(true);
        SchemaGraph::new(vec![root, child], CompilerOptions::default())
    }

    #[test]
    fn test_node_views() {
        let compiled = CompiledSchema::new(graph(), SchemaId(0));
        let root = compiled.root();
        assert_eq!(root.location, "urn:t#");

        let props: Vec<(&str, SchemaId)> = root.properties().map(|(n, s)| (n, s.id())).collect();
        assert_eq!(props, vec![("a", SchemaId(1))]);
        assert_eq!(root.all_of().next(), Some(compiled.node(SchemaId(1))));
        assert_eq!(compiled.find("urn:t#/properties/a").map(|n| n.id()), Some(SchemaId(1)));
        assert!(compiled.find("urn:t#/nope").is_none());
    }

    #[test]
    fn test_compiled_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<CompiledSchema>();
    }
}
