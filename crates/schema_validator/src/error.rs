//! Error types for compilation and validation.
//!
//! Compilation failures are fatal and described by [`CompileError`].
//! Validation failures are values: a [`ValidationError`] tree with one node
//! per failing keyword, carrying the keyword location, the instance location
//! and the errors of the sub-evaluations that caused it.

use bigdecimal::BigDecimal;
use schema_core::{InstanceLocation, Value, ValueError, escape};
use schema_loader::LoadError;
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

/// Result type for compiler and registry operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors that abort compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Resource could not be loaded or decoded
    #[error("failed to load resource '{url}': {source}")]
    Load {
        /// Resource URL
        url: String,
        /// Loader failure
        #[source]
        source: LoadError,
    },

    /// Document holds a value with no exact representation
    #[error("invalid schema document: {0}")]
    Document(#[from] ValueError),

    /// Keyword value has the wrong shape
    #[error("invalid keyword '{keyword}' at {location}: {reason}")]
    InvalidKeyword {
        /// Location of the schema node
        location: String,
        /// Offending keyword
        keyword: String,
        /// What is wrong with it
        reason: String,
    },

    /// Static reference points nowhere
    #[error("unresolved reference '{reference}' at {location}")]
    UnresolvedReference {
        /// Location of the keyword holding the reference
        location: String,
        /// Reference as written, resolved against the base URI
        reference: String,
    },

    /// Anchor declared twice in the same resource
    #[error("duplicate anchor '{anchor}' in resource {resource}")]
    DuplicateAnchor {
        /// Resource URI
        resource: String,
        /// Anchor name
        anchor: String,
    },

    /// Resource identifier declared twice in one document
    #[error("duplicate resource id '{id}' in {location}")]
    DuplicateId {
        /// Document URL
        location: String,
        /// Duplicated identifier
        id: String,
    },

    /// `$schema` names a meta-schema that is not a known draft
    #[error("unknown meta-schema '{url}' at {location}")]
    UnknownDraft {
        /// Location of the schema node
        location: String,
        /// Meta-schema URL
        url: String,
    },

    /// Schema object rejected by an enabled vocabulary's meta-schema
    #[error("schema at {location} does not satisfy meta-schema of vocabulary {vocabulary}: {source}")]
    MetaSchema {
        /// Location of the schema node
        location: String,
        /// Vocabulary URL
        vocabulary: String,
        /// Meta-schema validation failure
        #[source]
        source: Box<ValidationError>,
    },

    /// Vocabulary meta-schema failed to compile
    #[error("vocabulary {url} could not be set up: {source}")]
    Vocabulary {
        /// Vocabulary URL
        url: String,
        /// Underlying compile failure
        #[source]
        source: Box<CompileError>,
    },

    /// Vocabulary URL registered twice
    #[error("vocabulary {0} is already registered")]
    DuplicateVocabulary(String),

    /// Vocabulary URL not found in the registry
    #[error("vocabulary {0} is not registered")]
    UnknownVocabulary(String),

    /// A vocabulary's compile function rejected a keyword
    #[error("extension keyword error at {location}: {message}")]
    Extension {
        /// Location of the schema node
        location: String,
        /// Failure details
        message: String,
    },
}

impl CompileError {
    /// Creates a new invalid keyword error.
    pub fn invalid_keyword(
        location: impl Into<String>,
        keyword: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidKeyword {
            location: location.into(),
            keyword: keyword.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new unresolved reference error.
    pub fn unresolved(location: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            location: location.into(),
            reference: reference.into(),
        }
    }

    /// Creates a new extension error.
    pub fn extension(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl From<Infallible> for CompileError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Error kinds contributed by extension vocabularies.
pub trait ExtensionErrorKind: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Keyword path relative to the schema node, e.g. `["uniqueOrder"]`.
    fn keyword_path(&self) -> Vec<String>;

    /// Access to the concrete type, for callers that inspect error details.
    fn as_any(&self) -> &dyn Any;
}

/// What went wrong at a single keyword.
#[derive(Debug)]
pub enum ErrorKind {
    /// Top-level wrapper returned by `validate`
    Schema { location: String },
    /// Several keywords failed on the same node
    Group,
    /// The `false` schema
    FalseSchema,
    Type { got: String, want: Vec<String> },
    Enum { got: Value, want: Vec<Value> },
    Const { got: Value, want: Value },
    /// The comparator could not interpret a value
    Incomparable { keyword: String, reason: String },
    MinProperties { got: usize, want: usize },
    MaxProperties { got: usize, want: usize },
    Required { missing: Vec<String> },
    AdditionalProperties { properties: Vec<String> },
    PropertyNames { property: String },
    Dependency { property: String, missing: Vec<String> },
    DependentRequired { property: String, missing: Vec<String> },
    MinItems { got: usize, want: usize },
    MaxItems { got: usize, want: usize },
    AdditionalItems { count: usize },
    UniqueItems { duplicates: (usize, usize) },
    Contains,
    MinContains { got: Vec<usize>, want: usize },
    MaxContains { got: Vec<usize>, want: usize },
    MinLength { got: usize, want: usize },
    MaxLength { got: usize, want: usize },
    Pattern { got: String, want: String },
    ContentEncoding { want: String, reason: String },
    ContentMediaType { want: String, reason: String },
    ContentSchema,
    Minimum { got: BigDecimal, want: BigDecimal },
    Maximum { got: BigDecimal, want: BigDecimal },
    ExclusiveMinimum { got: BigDecimal, want: BigDecimal },
    ExclusiveMaximum { got: BigDecimal, want: BigDecimal },
    MultipleOf { got: BigDecimal, want: BigDecimal },
    /// Referenced schema failed (`$ref`, `$recursiveRef`, `$dynamicRef`)
    Reference { keyword: String, url: String },
    Not,
    AllOf,
    AnyOf,
    /// `None` when nothing matched, otherwise the first two matching indices
    OneOf { matched: Option<(usize, usize)> },
    /// `then` or `else` failed after `if` chose it
    Conditional { branch: String },
    RecursionLimit { depth: usize },
    InfiniteLoop { location: String },
    Extension(Box<dyn ExtensionErrorKind>),
}

impl ErrorKind {
    /// Wraps an extension error kind.
    pub fn extension(kind: impl ExtensionErrorKind) -> Self {
        Self::Extension(Box::new(kind))
    }

    /// Returns the extension error as `T`, if it is one.
    pub fn downcast_extension<T: 'static>(&self) -> Option<&T> {
        match self {
            ErrorKind::Extension(kind) => kind.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Keyword path relative to the failing schema node.
    pub fn keyword_path(&self) -> Vec<String> {
        let keyword = match self {
            ErrorKind::Schema { .. }
            | ErrorKind::Group
            | ErrorKind::FalseSchema
            | ErrorKind::RecursionLimit { .. }
            | ErrorKind::InfiniteLoop { .. } => return Vec::new(),
            ErrorKind::Extension(kind) => return kind.keyword_path(),
            ErrorKind::Dependency { property, .. } => {
                return vec!["dependencies".to_string(), property.clone()];
            }
            ErrorKind::DependentRequired { property, .. } => {
                return vec!["dependentRequired".to_string(), property.clone()];
            }
            ErrorKind::Incomparable { keyword, .. }
            | ErrorKind::Reference { keyword, .. } => return vec![keyword.clone()],
            ErrorKind::Conditional { branch } => return vec![branch.clone()],
            ErrorKind::Type { .. } => "type",
            ErrorKind::Enum { .. } => "enum",
            ErrorKind::Const { .. } => "const",
            ErrorKind::MinProperties { .. } => "minProperties",
            ErrorKind::MaxProperties { .. } => "maxProperties",
            ErrorKind::Required { .. } => "required",
            ErrorKind::AdditionalProperties { .. } => "additionalProperties",
            ErrorKind::PropertyNames { .. } => "propertyNames",
            ErrorKind::MinItems { .. } => "minItems",
            ErrorKind::MaxItems { .. } => "maxItems",
            ErrorKind::AdditionalItems { .. } => "additionalItems",
            ErrorKind::UniqueItems { .. } => "uniqueItems",
            ErrorKind::Contains => "contains",
            ErrorKind::MinContains { .. } => "minContains",
            ErrorKind::MaxContains { .. } => "maxContains",
            ErrorKind::MinLength { .. } => "minLength",
            ErrorKind::MaxLength { .. } => "maxLength",
            ErrorKind::Pattern { .. } => "pattern",
            ErrorKind::ContentEncoding { .. } => "contentEncoding",
            ErrorKind::ContentMediaType { .. } => "contentMediaType",
            ErrorKind::ContentSchema => "contentSchema",
            ErrorKind::Minimum { .. } => "minimum",
            ErrorKind::Maximum { .. } => "maximum",
            ErrorKind::ExclusiveMinimum { .. } => "exclusiveMinimum",
            ErrorKind::ExclusiveMaximum { .. } => "exclusiveMaximum",
            ErrorKind::MultipleOf { .. } => "multipleOf",
            ErrorKind::Not => "not",
            ErrorKind::AllOf => "allOf",
            ErrorKind::AnyOf => "anyOf",
            ErrorKind::OneOf { .. } => "oneOf",
        };
        vec![keyword.to_string()]
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Schema { location } => write!(f, "validation failed with '{location}'"),
            ErrorKind::Group => write!(f, "validation failed"),
            ErrorKind::FalseSchema => write!(f, "false schema"),
            ErrorKind::Type { got, want } => write!(f, "got {got}, want {}", want.join(" or ")),
            ErrorKind::Enum { got, want } => {
                let want: Vec<String> = want.iter().map(Value::to_string).collect();
                write!(f, "value {got} must be one of {}", want.join(", "))
            }
            ErrorKind::Const { got, want } => write!(f, "value {got} must be {want}"),
            ErrorKind::Incomparable { keyword, reason } => {
                write!(f, "{keyword}: cannot compare values: {reason}")
            }
            ErrorKind::MinProperties { got, want } => {
                write!(f, "minProperties: got {got}, want {want}")
            }
            ErrorKind::MaxProperties { got, want } => {
                write!(f, "maxProperties: got {got}, want {want}")
            }
            ErrorKind::Required { missing } => write!(f, "missing properties: {}", quoted(missing)),
            ErrorKind::AdditionalProperties { properties } => {
                write!(f, "additional properties {} not allowed", quoted(properties))
            }
            ErrorKind::PropertyNames { property } => write!(f, "invalid property name '{property}'"),
            ErrorKind::Dependency { property, missing }
            | ErrorKind::DependentRequired { property, missing } => write!(
                f,
                "properties {} required, if '{property}' exists",
                quoted(missing)
            ),
            ErrorKind::MinItems { got, want } => write!(f, "minItems: got {got}, want {want}"),
            ErrorKind::MaxItems { got, want } => write!(f, "maxItems: got {got}, want {want}"),
            ErrorKind::AdditionalItems { count } => {
                write!(f, "last {count} additional items not allowed")
            }
            ErrorKind::UniqueItems { duplicates: (i, j) } => {
                write!(f, "items at {i} and {j} are equal")
            }
            ErrorKind::Contains => write!(f, "no items match contains schema"),
            ErrorKind::MinContains { got, want } => write!(
                f,
                "min {want} items required to match contains schema, but matched {} items",
                got.len()
            ),
            ErrorKind::MaxContains { got, want } => write!(
                f,
                "max {want} items required to match contains schema, but matched {} items",
                got.len()
            ),
            ErrorKind::MinLength { got, want } => write!(f, "minLength: got {got}, want {want}"),
            ErrorKind::MaxLength { got, want } => write!(f, "maxLength: got {got}, want {want}"),
            ErrorKind::Pattern { got, want } => write!(f, "'{got}' does not match pattern '{want}'"),
            ErrorKind::ContentEncoding { want, reason } => {
                write!(f, "value is not {want} encoded: {reason}")
            }
            ErrorKind::ContentMediaType { want, reason } => {
                write!(f, "value is not of media type {want}: {reason}")
            }
            ErrorKind::ContentSchema => write!(f, "decoded content does not match contentSchema"),
            ErrorKind::Minimum { got, want } => write!(f, "minimum: got {got}, want {want}"),
            ErrorKind::Maximum { got, want } => write!(f, "maximum: got {got}, want {want}"),
            ErrorKind::ExclusiveMinimum { got, want } => {
                write!(f, "exclusiveMinimum: got {got}, want {want}")
            }
            ErrorKind::ExclusiveMaximum { got, want } => {
                write!(f, "exclusiveMaximum: got {got}, want {want}")
            }
            ErrorKind::MultipleOf { got, want } => write!(f, "{got} not multipleOf {want}"),
            ErrorKind::Reference { url, .. } => write!(f, "validation failed with '{url}'"),
            ErrorKind::Not => write!(f, "'not' failed"),
            ErrorKind::AllOf => write!(f, "allOf failed"),
            ErrorKind::AnyOf => write!(f, "anyOf failed"),
            ErrorKind::OneOf { matched: None } => write!(f, "oneOf failed, none matched"),
            ErrorKind::OneOf {
                matched: Some((i, j)),
            } => write!(f, "oneOf failed, subschemas {i}, {j} matched"),
            ErrorKind::Conditional { branch } => write!(f, "if-{branch} failed"),
            ErrorKind::RecursionLimit { depth } => {
                write!(f, "maximum validation depth {depth} exceeded")
            }
            ErrorKind::InfiniteLoop { location } => {
                write!(f, "validation re-enters '{location}' without consuming input")
            }
            ErrorKind::Extension(kind) => write!(f, "{kind}"),
        }
    }
}

/// A node of the validation error tree.
#[derive(Debug)]
pub struct ValidationError {
    /// Absolute location of the failing keyword
    pub schema_location: String,
    /// Location of the offending value in the instance
    pub instance_location: InstanceLocation,
    /// What went wrong
    pub kind: ErrorKind,
    /// Errors of the sub-evaluations behind this one
    pub causes: Vec<ValidationError>,
}

impl ValidationError {
    /// Creates a leaf error for a keyword of the schema node at `node_location`.
    pub fn new(node_location: &str, instance_location: &InstanceLocation, kind: ErrorKind) -> Self {
        Self {
            schema_location: keyword_location(node_location, &kind.keyword_path()),
            instance_location: instance_location.clone(),
            kind,
            causes: Vec::new(),
        }
    }

    /// Attaches child errors.
    pub fn with_causes(mut self, causes: Vec<ValidationError>) -> Self {
        self.causes = causes;
        self
    }

    /// Iterates the errors without causes, depth first.
    pub fn leaves(&self) -> Vec<&ValidationError> {
        if self.causes.is_empty() {
            return vec![self];
        }
        self.causes.iter().flat_map(ValidationError::leaves).collect()
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(
            f,
            "{}- at '{}': {}",
            "  ".repeat(depth),
            self.instance_location,
            self.kind
        )?;
        for cause in &self.causes {
            writeln!(f)?;
            cause.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Schema { location } => {
                write!(f, "jsonschema validation failed with '{location}'")?;
                for cause in &self.causes {
                    writeln!(f)?;
                    cause.fmt_tree(f, 0)?;
                }
                Ok(())
            }
            _ => self.fmt_tree(f, 0),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Appends a keyword path to a schema node location.
pub(crate) fn keyword_location(node_location: &str, path: &[String]) -> String {
    let mut location = node_location.to_string();
    for token in path {
        location.push('/');
        location.push_str(&escape(token));
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyword_location() {
        let err = ValidationError::new(
            "file:///s.json#/properties/a",
            &InstanceLocation::root().property("a"),
            ErrorKind::MinLength { got: 1, want: 2 },
        );
        assert_eq!(err.schema_location, "file:///s.json#/properties/a/minLength");
        assert_eq!(err.instance_location.to_string(), "/a");
    }

    #[test]
    fn test_dependent_required_path() {
        let kind = ErrorKind::DependentRequired {
            property: "a/b".to_string(),
            missing: vec!["c".to_string()],
        };
        let err = ValidationError::new("urn:x#", &InstanceLocation::root(), kind);
        assert_eq!(err.schema_location, "urn:x#/dependentRequired/a~1b");
    }

    #[test]
    fn test_display_tree() {
        let leaf = ValidationError::new(
            "urn:x#/properties/a",
            &InstanceLocation::root().property("a"),
            ErrorKind::Type {
                got: "string".to_string(),
                want: vec!["integer".to_string()],
            },
        );
        let top = ValidationError::new(
            "urn:x#",
            &InstanceLocation::root(),
            ErrorKind::Schema {
                location: "urn:x#".to_string(),
            },
        )
        .with_causes(vec![leaf]);

        assert_eq!(
            top.to_string(),
            "jsonschema validation failed with 'urn:x#'\n- at '/a': got string, want integer"
        );
        assert_eq!(top.leaves().len(), 1);
    }

    #[test]
    fn test_compile_error_messages() {
        let err = CompileError::invalid_keyword("urn:x#", "minLength", "must be a non-negative integer");
        assert_eq!(
            err.to_string(),
            "invalid keyword 'minLength' at urn:x#: must be a non-negative integer"
        );
        let err = CompileError::unresolved("urn:x#/$ref", "urn:x#/missing");
        assert_eq!(err.to_string(), "unresolved reference 'urn:x#/missing' at urn:x#/$ref");
    }
}
