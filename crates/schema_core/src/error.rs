//! Error types for the value and type model.
//!
//! These errors are raised by the type registry, JSON-pointer handling and
//! the structural comparator. They never abort a validation run on their own:
//! the validator converts them into leaf validation errors.

use thiserror::Error;

/// Result type for value model operations.
pub type Result<T> = std::result::Result<T, ValueError>;

/// Main error type for the value and type model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A value could not be interpreted by the comparator
    #[error("cannot compare value of type '{type_name}'")]
    Incomparable {
        /// Declared type name of the offending value
        type_name: String,
    },

    /// Type name is not one of the JSON types and was never registered
    #[error("unknown type name '{0}'")]
    UnknownType(String),

    /// Type name is empty or otherwise unusable
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),

    /// No more type tags can be allocated
    #[error("type registry is full ({0} types registered)")]
    TypeRegistryFull(usize),

    /// Number text that has no exact decimal representation
    #[error("number '{0}' cannot be represented exactly")]
    InvalidNumber(String),

    /// Malformed JSON pointer
    #[error("invalid JSON pointer '{0}'")]
    InvalidPointer(String),
}

impl ValueError {
    /// Creates a new incomparable-value error.
    pub fn incomparable(type_name: impl Into<String>) -> Self {
        Self::Incomparable {
            type_name: type_name.into(),
        }
    }

    /// Creates a new unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType(name.into())
    }
}
