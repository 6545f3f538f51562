//! Resource loading for schema documents.
//!
//! The compiler never touches bytes or files itself: it asks a
//! [`ResourceLoader`] for the decoded value tree behind a URL. This crate
//! provides the loader trait, in-memory and file-backed loaders, and the
//! JSON/YAML/TOML decoders they share.
//!
//! # Example
//!
//! ```rust
//! use schema_loader::{MemoryLoader, ResourceLoader, to_url};
//!
//! let mut loader = MemoryLoader::new();
//! loader
//!     .add_yaml("https://example.com/person.yaml", "type: object\nrequired: [name]\n")
//!     .unwrap();
//!
//! let url = to_url("https://example.com/person.yaml").unwrap();
//! let doc = loader.load(&url).unwrap();
//! assert_eq!(doc.get("type").and_then(|v| v.as_str()), Some("object"));
//! ```

mod loader;
mod location;

pub use loader::*;
pub use location::*;

use schema_core::{Value, ValueError};
use std::convert::Infallible;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a resource.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No loader knows this location
    #[error("resource not found: {0}")]
    NotFound(String),

    /// JSON decoding failed
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding failed
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML decoding failed
    #[error("failed to parse TOML: {0}")]
    Toml(String),

    /// Decoded tree holds a value with no exact representation
    #[error("invalid document: {0}")]
    Value(#[from] ValueError),

    /// File I/O error
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL scheme this loader cannot handle
    #[error("unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme {
        /// Offending scheme
        scheme: String,
        /// Full URL
        url: String,
    },

    /// Location could not be turned into a URL
    #[error("invalid resource location '{location}': {reason}")]
    InvalidLocation {
        /// Location as given by the caller
        location: String,
        /// Why it was rejected
        reason: String,
    },
}

impl LoadError {
    /// Creates a new invalid location error.
    pub fn invalid_location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error means "not here" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        match self {
            LoadError::NotFound(_) => true,
            LoadError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<Infallible> for LoadError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON format (.json and anything unrecognised)
    Json,
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a document from a JSON string.
pub fn parse_json(content: &str) -> Result<Value> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(Value::try_from(value)?)
}

/// Parse a document from a YAML string.
///
/// # Example
///
/// ```rust
/// use schema_loader::parse_yaml;
///
/// let doc = parse_yaml("minimum: 0.1\n").unwrap();
/// assert!(doc.get("minimum").is_some());
/// ```
pub fn parse_yaml(content: &str) -> Result<Value> {
    let value: serde_json::Value = serde_yaml_ng::from_str(content)?;
    Ok(Value::try_from(value)?)
}

/// Parse a document from a TOML string.
pub fn parse_toml(content: &str) -> Result<Value> {
    let value: serde_json::Value =
        toml::from_str(content).map_err(|e| LoadError::Toml(e.to_string()))?;
    Ok(Value::try_from(value)?)
}

/// Parse a document in the given format.
pub fn parse_str(content: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => parse_json(content),
        DocumentFormat::Yaml => parse_yaml(content),
        DocumentFormat::Toml => parse_toml(content),
    }
}

/// Detect the document format from a path based on its extension.
///
/// * `.yaml`, `.yml` → `DocumentFormat::Yaml`
/// * `.toml` → `DocumentFormat::Toml`
/// * anything else, including no extension → `DocumentFormat::Json`
pub fn detect_format(path: &Path) -> DocumentFormat {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => DocumentFormat::Yaml,
        Some("toml") => DocumentFormat::Toml,
        _ => DocumentFormat::Json,
    }
}

/// Parse a document from a file with automatic format detection.
pub fn parse_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, detect_format(path))
}
