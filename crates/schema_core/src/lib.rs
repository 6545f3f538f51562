//! # Schema Core
//!
//! Value and type model shared by the schema compiler and the validation
//! engine.
//!
//! ## Key Concepts
//!
//! - **Value**: an owned JSON-like tree with exact decimal numbers and
//!   room for logical types (dates, timestamps, custom typed values)
//! - **TypeTag / TypeSet**: an extensible bitset type system; the seven JSON
//!   types plus extension types registered at runtime
//! - **Equality**: deep structural comparison and duplicate detection across
//!   heterogeneous representations
//! - **Locations**: JSON pointers and instance locations used in error reports
//!
//! ## Example
//!
//! ```rust
//! use schema_core::{Value, TypeTag, duplicates};
//! use serde_json::json;
//!
//! let values = Value::try_from(json!([1, 2.0, 2])).unwrap();
//! let values = values.as_array().unwrap();
//! assert_eq!(duplicates(values).unwrap(), Some((1, 2)));
//! assert_eq!(values[0].type_tag(), Some(TypeTag::NUMBER));
//! ```

pub mod equality;
pub mod error;
pub mod location;
pub mod types;
pub mod value;

pub use equality::*;
pub use error::*;
pub use location::*;
pub use types::*;
pub use value::*;
