//! Read-only queries over compiled schemas.
//!
//! These helpers serve code that generates forms, tables or documentation
//! from a schema; validation never uses them.

use crate::schema::SchemaNode;
use indexmap::IndexMap;
use schema_core::{TypeSet, TypeTag};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Entry of [`SchemaNode::fields_of_type`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    /// A matching property schema
    Schema(SchemaNode<'a>),
    /// Matching fields below an object-typed property
    Nested(IndexMap<String, Field<'a>>),
}

impl<'a> SchemaNode<'a> {
    /// Properties declared by this node, its `$ref` target and its `allOf`
    /// members.
    ///
    /// The reference target is flattened first, then each `allOf` member in
    /// order, then the node's own `properties`; a later declaration of the
    /// same name replaces the earlier one.
    pub fn all_properties(self) -> IndexMap<String, SchemaNode<'a>> {
        let mut out = IndexMap::new();
        let mut visited = HashSet::new();
        self.collect_properties(&mut out, &mut visited);
        out
    }

    fn collect_properties(
        self,
        out: &mut IndexMap<String, SchemaNode<'a>>,
        visited: &mut HashSet<crate::SchemaId>,
    ) {
        if !visited.insert(self.id()) {
            return;
        }
        if let Some(target) = self.reference() {
            target.collect_properties(out, visited);
        }
        for member in self.all_of() {
            member.collect_properties(out, visited);
        }
        for (name, schema) in self.properties() {
            out.insert(name.to_string(), schema);
        }
    }

    /// [`all_properties`](Self::all_properties) sorted by the `order`
    /// annotation; properties without one come last in their original order.
    pub fn sorted_properties(self) -> Vec<(String, SchemaNode<'a>)> {
        let mut props: Vec<(String, SchemaNode<'a>)> = self.all_properties().into_iter().collect();
        props.sort_by(|(_, a), (_, b)| match (&a.order, &b.order) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        props
    }

    /// Whether `name` is listed in this node's `required`.
    pub fn is_required(self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// First declared type other than `null`.
    pub fn primary_type(self) -> Option<&'static str> {
        self.types?
            .iter()
            .find(|&tag| tag != TypeTag::NULL)
            .map(TypeTag::name)
    }

    /// Collects properties whose declared type intersects `types`, descending
    /// into object-typed properties and into the `items` of arrays.
    ///
    /// An empty `types` slice selects every typed property. A property whose
    /// descendants match is returned as [`Field::Nested`] instead of as a leaf.
    pub fn fields_of_type(self, types: &[TypeTag]) -> IndexMap<String, Field<'a>> {
        let filter: TypeSet = types.iter().copied().collect();
        let mut path = HashSet::new();
        self.collect_fields(filter, &mut path)
    }

    fn collect_fields(
        self,
        filter: TypeSet,
        path: &mut HashSet<crate::SchemaId>,
    ) -> IndexMap<String, Field<'a>> {
        let mut fields = IndexMap::new();
        let Some(container) = self.container() else {
            return fields;
        };
        if !path.insert(container.id()) {
            return fields;
        }

        for (name, prop) in container.all_properties() {
            let prop = prop.resolve();
            let Some(types) = prop.types else {
                continue;
            };
            if filter.is_empty() || types.intersects(&filter) {
                fields.insert(name.clone(), Field::Schema(prop));
            }
            if types.contains(TypeTag::OBJECT) || types.contains(TypeTag::ARRAY) {
                let nested = prop.collect_fields(filter, path);
                if !nested.is_empty() {
                    fields.insert(name, Field::Nested(nested));
                }
            }
        }

        path.remove(&container.id());
        fields
    }

    /// The object schema whose properties describe this node's values:
    /// the node itself for objects, the element schema for arrays.
    fn container(self) -> Option<SchemaNode<'a>> {
        let node = self.resolve();
        let types = node.types?;
        if types.contains(TypeTag::ARRAY) {
            let items = node.items()?.resolve();
            items
                .types
                .is_some_and(|t| t.contains(TypeTag::OBJECT))
                .then_some(items)
        } else if types.contains(TypeTag::OBJECT) {
            Some(node)
        } else {
            None
        }
    }

    /// Follows `$ref` from nodes that declare no type of their own.
    fn resolve(self) -> SchemaNode<'a> {
        let mut node = self;
        let mut seen = HashSet::new();
        while node.types.is_none() && seen.insert(node.id()) {
            match node.reference() {
                Some(target) => node = target,
                None => break,
            }
        }
        node
    }
}
