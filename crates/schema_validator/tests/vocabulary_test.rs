//! Custom vocabularies registered in the process-wide registry.

use bigdecimal::BigDecimal;
use num_traits::Zero;
use pretty_assertions::assert_eq;
use schema_core::{Map, Value};
use schema_validator::{
    CompileError, Compiler, CompilerContext, DuplicateOrder, ErrorKind, Extension,
    ExtensionErrorKind, ORDER_VOCABULARY_URL, Result, ValidatorContext, Vocabulary,
    global_registry, lookup_vocabulary, register_order_vocabulary, register_vocabulary,
};
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::sync::Once;

const EVEN_VOCABULARY_URL: &str = "https://example.com/vocab/even";
const PREFIX_VOCABULARY_URL: &str = "https://example.com/vocab/prefix";

static REGISTER: Once = Once::new();

fn register() {
    REGISTER.call_once(|| {
        register_order_vocabulary(&global_registry()).unwrap();
        let even = Vocabulary::new(
            EVEN_VOCABULARY_URL,
            json!({"properties": {"even": {"type": "boolean"}}}),
            compile_even,
        )
        .unwrap();
        register_vocabulary(even).unwrap();
        let prefix = Vocabulary::new(
            PREFIX_VOCABULARY_URL,
            json!({"properties": {"coversPrefix": {"type": "string"}}}),
            compile_covers_prefix,
        )
        .unwrap();
        register_vocabulary(prefix).unwrap();
    });
}

fn compile_even(ctx: &CompilerContext<'_>, obj: &Map) -> Result<Option<Box<dyn Extension>>> {
    match obj.get("even") {
        Some(Value::Bool(true)) => Ok(Some(Box::new(Even))),
        Some(Value::Bool(false)) | None => Ok(None),
        Some(_) => Err(ctx.error("even must be a boolean")),
    }
}

#[derive(Debug)]
struct Even;

impl Extension for Even {
    fn validate(&self, ctx: &mut ValidatorContext<'_>, instance: &Value) {
        let Some(n) = instance.as_number() else {
            return;
        };
        if !(n.clone() % BigDecimal::from(2)).is_zero() {
            ctx.report_error(ErrorKind::extension(NotEven(n.to_string())));
        }
    }
}

#[derive(Debug)]
struct NotEven(String);

impl fmt::Display for NotEven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not even", self.0)
    }
}

impl ExtensionErrorKind for NotEven {
    fn keyword_path(&self) -> Vec<String> {
        vec!["even".to_string()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn compile_covers_prefix(
    _ctx: &CompilerContext<'_>,
    obj: &Map,
) -> Result<Option<Box<dyn Extension>>> {
    Ok(obj.get("coversPrefix").and_then(Value::as_str).map(|prefix| {
        Box::new(CoversPrefix(prefix.to_string())) as Box<dyn Extension>
    }))
}

/// Marks members and string elements starting with a prefix as evaluated.
#[derive(Debug)]
struct CoversPrefix(String);

impl Extension for CoversPrefix {
    fn validate(&self, ctx: &mut ValidatorContext<'_>, instance: &Value) {
        match instance {
            Value::Object(obj) => {
                for name in obj.keys().filter(|name| name.starts_with(&self.0)) {
                    ctx.mark_property_evaluated(name);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if item.as_str().is_some_and(|s| s.starts_with(&self.0)) {
                        ctx.mark_item_evaluated(i);
                    }
                }
            }
            _ => {}
        }
    }
}

fn enabled_compiler() -> Compiler {
    register();
    let mut compiler = Compiler::new();
    compiler.enable_vocabulary(EVEN_VOCABULARY_URL).unwrap();
    compiler.enable_vocabulary(ORDER_VOCABULARY_URL).unwrap();
    compiler.enable_vocabulary(PREFIX_VOCABULARY_URL).unwrap();
    compiler
}

#[test]
fn test_custom_keyword_is_applied() {
    let mut compiler = enabled_compiler();
    compiler
        .add_resource(
            "urn:even",
            json!({"properties": {"count": {"type": "integer", "even": true}}}),
        )
        .unwrap();
    let schema = compiler.compile("urn:even").unwrap();

    assert!(schema.is_valid(&Value::try_from(json!({"count": 4})).unwrap()));

    let err = schema.validate(&Value::try_from(json!({"count": 3})).unwrap()).unwrap_err();
    let leaf = err.leaves()[0];
    assert_eq!(leaf.kind.to_string(), "3 is not even");
    assert_eq!(leaf.schema_location, "urn:even#/properties/count/even");
    assert_eq!(leaf.instance_location.to_string(), "/count");
    assert!(leaf.kind.downcast_extension::<NotEven>().is_some());
}

#[test]
fn test_extension_marks_members_evaluated() {
    let mut compiler = enabled_compiler();
    compiler
        .add_resource(
            "urn:prefix",
            json!({
                "properties": {"id": true},
                "coversPrefix": "x-",
                "unevaluatedProperties": false
            }),
        )
        .unwrap();
    let schema = compiler.compile("urn:prefix").unwrap();

    assert!(schema.is_valid(&Value::try_from(json!({"id": 1, "x-trace": "abc"})).unwrap()));
    let err = schema
        .validate(&Value::try_from(json!({"id": 1, "trace": "abc"})).unwrap())
        .unwrap_err();
    assert_eq!(err.leaves()[0].instance_location.to_string(), "/trace");
}

#[test]
fn test_extension_marks_items_evaluated() {
    let mut compiler = enabled_compiler();
    compiler
        .add_resource(
            "urn:prefix-items",
            json!({
                "prefixItems": [{"type": "integer"}],
                "coversPrefix": "x-",
                "unevaluatedItems": false
            }),
        )
        .unwrap();
    let schema = compiler.compile("urn:prefix-items").unwrap();

    assert!(schema.is_valid(&Value::try_from(json!([1, "x-a", "x-b"])).unwrap()));
    assert!(!schema.is_valid(&Value::try_from(json!([1, "x-a", "b"])).unwrap()));
}

#[test]
fn test_keywords_are_ignored_unless_enabled() {
    register();
    let mut compiler = Compiler::new();
    compiler
        .add_resource("urn:even", json!({"even": true, "uniqueOrder": "pos"}))
        .unwrap();
    let schema = compiler.compile("urn:even").unwrap();
    assert!(schema.is_valid(&Value::try_from(json!(3)).unwrap()));
    assert!(schema.is_valid(&Value::try_from(json!([{"pos": 1}, {"pos": 1}])).unwrap()));
}

#[test]
fn test_meta_schema_guards_keyword_values() {
    let mut compiler = enabled_compiler();
    compiler
        .add_resource("urn:even", json!({"even": "yes"}))
        .unwrap();
    match compiler.compile("urn:even").unwrap_err() {
        CompileError::MetaSchema { vocabulary, .. } => {
            assert_eq!(vocabulary, EVEN_VOCABULARY_URL)
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_unique_order_names_both_records() {
    let mut compiler = enabled_compiler();
    compiler
        .add_resource(
            "urn:steps",
            json!({
                "type": "array",
                "items": {"type": "object", "properties": {"order": {"type": "integer"}}},
                "uniqueOrder": "order"
            }),
        )
        .unwrap();
    let schema = compiler.compile("urn:steps").unwrap();

    let steps = Value::try_from(json!([
        {"name": "fetch", "order": 1},
        {"name": "build", "order": 2},
        {"name": "test", "order": 1}
    ]))
    .unwrap();
    let err = schema.validate(&steps).unwrap_err();
    let leaf = err.leaves()[0];
    assert_eq!(
        leaf.kind.downcast_extension::<DuplicateOrder>(),
        Some(&DuplicateOrder {
            key: "order".to_string(),
            first: 0,
            second: 2,
        })
    );
    assert_eq!(leaf.kind.to_string(), "order at 0 and 2 have same order");
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_urls() {
    register();
    assert!(lookup_vocabulary(ORDER_VOCABULARY_URL).is_some());
    assert!(matches!(
        register_order_vocabulary(&global_registry()).unwrap_err(),
        CompileError::DuplicateVocabulary(_)
    ));

    let mut compiler = Compiler::new();
    assert!(matches!(
        compiler.enable_vocabulary("https://example.com/vocab/none"),
        Err(CompileError::UnknownVocabulary(_))
    ));
}

#[test]
fn test_vocabulary_with_broken_meta_schema() {
    let err = Vocabulary::new(
        "https://example.com/vocab/broken",
        json!({"type": 5}),
        compile_even,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Vocabulary { .. }));
}
