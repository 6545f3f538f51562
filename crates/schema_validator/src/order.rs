//! Record-ordering vocabulary.
//!
//! Adds the `uniqueOrder` keyword: the name of a field that must hold a
//! distinct value in every object element of an array.
//!
//! ```json
//! {"type": "array", "uniqueOrder": "position"}
//! ```
//!
//! accepts `[{"position": 1}, {"position": 2}]` and rejects
//! `[{"position": 1}, {"position": 1}]`.

use crate::vocab::{CompilerContext, Extension, ValidatorContext, Vocabulary, VocabularyRegistry};
use crate::{ErrorKind, ExtensionErrorKind, Result};
use schema_core::{Map, Value};
use serde_json::json;
use std::any::Any;
use std::fmt;

/// Identifier of the record-ordering vocabulary.
pub const ORDER_VOCABULARY_URL: &str = "https://json-schema.org/draft/2020-12/vocab/order";

/// Builds the vocabulary, ready to be registered.
pub fn order_vocabulary() -> Result<Vocabulary> {
    let meta_schema = json!({
        "properties": {
            "uniqueOrder": {"type": "string"}
        }
    });
    Vocabulary::new(ORDER_VOCABULARY_URL, meta_schema, compile_unique_order)
}

/// Registers the vocabulary in `registry`.
pub fn register_order_vocabulary(registry: &VocabularyRegistry) -> Result<()> {
    registry.register(order_vocabulary()?)
}

fn compile_unique_order(_ctx: &CompilerContext<'_>, obj: &Map) -> Result<Option<Box<dyn Extension>>> {
    Ok(obj
        .get("uniqueOrder")
        .and_then(Value::as_str)
        .map(|key| Box::new(UniqueOrder { key: key.to_string() }) as Box<dyn Extension>))
}

#[derive(Debug)]
struct UniqueOrder {
    key: String,
}

impl Extension for UniqueOrder {
    fn validate(&self, ctx: &mut ValidatorContext<'_>, instance: &Value) {
        let Value::Array(items) = instance else {
            return;
        };

        // Element index alongside the field value, for elements that have the field.
        let (positions, keys): (Vec<usize>, Vec<Value>) = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.get(&self.key).map(|key| (i, key.clone())))
            .unzip();

        match ctx.duplicates("uniqueOrder", &keys) {
            Ok(None) => {}
            Ok(Some((i, j))) => ctx.report_error(ErrorKind::extension(DuplicateOrder {
                key: self.key.clone(),
                first: positions[i],
                second: positions[j],
            })),
            Err(err) => ctx.report_raw(err),
        }
    }
}

/// Two array elements share the same ordering value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateOrder {
    /// Field name
    pub key: String,
    /// Index of the earlier element
    pub first: usize,
    /// Index of the later element
    pub second: usize,
}

impl fmt::Display for DuplicateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "order at {} and {} have same {}",
            self.first, self.second, self.key
        )
    }
}

impl ExtensionErrorKind for DuplicateOrder {
    fn keyword_path(&self) -> Vec<String> {
        vec!["uniqueOrder".to_string()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompileError, Compiler};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn compiler() -> Compiler {
        let registry = Arc::new(VocabularyRegistry::new());
        register_order_vocabulary(&registry).unwrap();
        let mut compiler = Compiler::new().with_registry(registry);
        compiler.enable_vocabulary(ORDER_VOCABULARY_URL).unwrap();
        compiler
    }

    #[test]
    fn test_duplicate_order_names_both_elements() {
        let mut compiler = compiler();
        compiler
            .add_resource("urn:order", json!({"uniqueOrder": "pos"}))
            .unwrap();
        let schema = compiler.compile("urn:order").unwrap();

        let instance =
            Value::try_from(json!([{"pos": 1}, {"other": 1}, {"pos": 2}, {"pos": 1}])).unwrap();
        let err = schema.validate(&instance).unwrap_err();
        let leaf = err.leaves()[0];

        let kind = leaf.kind.downcast_extension::<DuplicateOrder>().unwrap();
        assert_eq!(
            kind,
            &DuplicateOrder {
                key: "pos".to_string(),
                first: 0,
                second: 3,
            }
        );
        assert_eq!(leaf.kind.to_string(), "order at 0 and 3 have same pos");
        assert_eq!(leaf.schema_location, "urn:order#/uniqueOrder");
    }

    #[test]
    fn test_distinct_orders_pass() {
        let mut compiler = compiler();
        compiler
            .add_resource("urn:order", json!({"uniqueOrder": "pos"}))
            .unwrap();
        let schema = compiler.compile("urn:order").unwrap();
        assert!(schema.is_valid(&Value::try_from(json!([{"pos": 1}, {"pos": 2}])).unwrap()));
        assert!(schema.is_valid(&Value::try_from(json!("not an array")).unwrap()));
    }

    #[derive(Debug)]
    struct Opaque;

    impl schema_core::SchemaTyped for Opaque {
        fn schema_type(&self) -> &str {
            "opaque-order"
        }
    }

    #[test]
    fn test_incomparable_orders_name_the_keyword() {
        let mut compiler = compiler();
        compiler
            .add_resource("urn:order", json!({"uniqueOrder": "pos"}))
            .unwrap();
        let schema = compiler.compile("urn:order").unwrap();

        let record = |pos: Value| {
            let mut map = Map::new();
            map.insert("pos".to_string(), pos);
            Value::Object(map)
        };
        let instance = Value::Array(vec![
            record(Value::from(1)),
            record(Value::Custom(Arc::new(Opaque))),
        ]);
        let err = schema.validate(&instance).unwrap_err();
        let leaf = err.leaves()[0];
        match &leaf.kind {
            ErrorKind::Incomparable { keyword, .. } => assert_eq!(keyword, "uniqueOrder"),
            other => panic!("unexpected error kind {other:?}"),
        }
        assert_eq!(leaf.schema_location, "urn:order#/uniqueOrder");
    }

    #[test]
    fn test_meta_schema_rejects_non_string() {
        let mut compiler = compiler();
        compiler
            .add_resource("urn:order", json!({"uniqueOrder": 5}))
            .unwrap();
        let err = compiler.compile("urn:order").unwrap_err();
        assert!(matches!(err, CompileError::MetaSchema { .. }));
    }
}
