//! # Schema Validator
//!
//! Compiles JSON-Schema-style documents into an immutable schema graph and
//! validates [`Value`](schema_core::Value) trees against it:
//!
//! - Drafts 4, 6, 7, 2019-09 and 2020-12, selected by `$schema` or by
//!   [`CompilerOptions::default_draft`]
//! - Static, dynamic and recursive references, anchors and cyclic schemas
//! - Exact decimal arithmetic for numeric keywords
//! - Unevaluated properties and items across applicators
//! - Pluggable keyword vocabularies with their own meta-schemas
//! - Introspection helpers for generating forms and documentation
//!
//! ## Example
//!
//! ```rust
//! use schema_validator::{Compiler, ErrorKind};
//! use schema_core::Value;
//! use serde_json::json;
//!
//! let mut compiler = Compiler::new();
//! compiler
//!     .add_resource(
//!         "https://example.com/person.json",
//!         json!({
//!             "type": "object",
//!             "properties": {"age": {"type": "integer", "minimum": 0}},
//!             "required": ["age"]
//!         }),
//!     )
//!     .unwrap();
//! let schema = compiler.compile("https://example.com/person.json").unwrap();
//!
//! assert!(schema.is_valid(&Value::try_from(json!({"age": 42})).unwrap()));
//!
//! let err = schema.validate(&Value::try_from(json!({"age": -1})).unwrap()).unwrap_err();
//! let leaf = err.leaves()[0];
//! assert!(matches!(leaf.kind, ErrorKind::Minimum { .. }));
//! assert_eq!(leaf.instance_location.to_string(), "/age");
//! ```

mod compiler;
mod content;
mod draft;
mod error;
mod introspect;
mod keywords;
mod options;
mod order;
mod resource;
mod schema;
mod validator;
mod vocab;

pub use compiler::*;
pub use content::*;
pub use draft::*;
pub use error::*;
pub use introspect::*;
pub use options::*;
pub use order::*;
pub use schema::*;
pub use vocab::*;
