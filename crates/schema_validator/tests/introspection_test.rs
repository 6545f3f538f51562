//! Schema introspection: property flattening, ordering and field projection.

use pretty_assertions::assert_eq;
use schema_core::TypeTag;
use schema_validator::{CompiledSchema, Compiler, Field};
use serde_json::json;

fn compile(doc: serde_json::Value) -> CompiledSchema {
    let mut compiler = Compiler::new();
    compiler.add_resource("urn:forms", doc).unwrap();
    compiler.compile("urn:forms").unwrap()
}

fn contact() -> CompiledSchema {
    compile(json!({
        "$defs": {
            "entity": {
                "properties": {
                    "id": {"type": "integer", "order": 0},
                    "x": {"title": "from ref"}
                },
                "required": ["id"]
            },
            "audited": {
                "properties": {
                    "created": {"type": "date-time", "order": 9},
                    "x": {"title": "from first allOf"}
                }
            }
        },
        "$ref": "#/$defs/entity",
        "allOf": [
            {"$ref": "#/$defs/audited"},
            {"properties": {"x": {"title": "from second allOf"}}}
        ],
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {"type": "string", "order": 1},
            "birthday": {"type": ["date", "null"], "order": 2},
            "address": {
                "type": "object",
                "properties": {
                    "street": {"type": "string"},
                    "since": {"type": "date"}
                }
            }
        }
    }))
}

#[test]
fn test_all_properties_merges_ref_and_all_of() {
    let schema = contact();
    let props = schema.root().all_properties();

    let names: Vec<&str> = props.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["id", "x", "created", "name", "birthday", "address"]
    );
    assert_eq!(props["x"].title.as_deref(), Some("from second allOf"));
}

#[test]
fn test_sorted_properties_follow_order_annotation() {
    let schema = contact();
    let names: Vec<String> = schema
        .root()
        .sorted_properties()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(
        names,
        vec!["id", "name", "birthday", "created", "x", "address"]
    );
}

#[test]
fn test_required_and_primary_type() {
    let schema = contact();
    let root = schema.root();
    assert!(root.is_required("name"));
    // Only the node's own list counts.
    assert!(!root.is_required("id"));

    let props = root.all_properties();
    assert_eq!(props["birthday"].primary_type(), Some("date"));
    assert_eq!(props["x"].primary_type(), None);
}

#[test]
fn test_fields_of_type_finds_dates() {
    let schema = contact();
    let fields = schema
        .root()
        .fields_of_type(&[TypeTag::DATE, TypeTag::DATE_TIME]);

    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["created", "birthday", "address"]);
    match &fields["address"] {
        Field::Nested(inner) => match &inner["since"] {
            Field::Schema(node) => assert_eq!(
                node.location,
                "urn:forms#/properties/address/properties/since"
            ),
            other => panic!("unexpected field {other:?}"),
        },
        other => panic!("unexpected field {other:?}"),
    }
}
