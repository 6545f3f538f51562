//! Compiler and validation settings.

use crate::Draft;
use serde::{Deserialize, Serialize};

/// Default bound on nested schema applications during one validation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How values carrying an extension type tag meet the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionTypePolicy {
    /// The extension type name must be listed in `type`.
    #[default]
    Explicit,
    /// Extension-typed values satisfy every declared type set.
    Implicit,
}

/// Settings captured by a compiled schema.
///
/// # Example
///
/// ```rust
/// use schema_validator::{CompilerOptions, Draft};
///
/// let options = CompilerOptions::new()
///     .with_default_draft(Draft::V7)
///     .with_max_depth(64);
/// assert_eq!(options.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Dialect for resources without `$schema`
    pub default_draft: Draft,
    /// Maximum nesting of schema applications
    pub max_depth: usize,
    /// Assert `contentEncoding`/`contentMediaType`/`contentSchema` in 2019-09 and later
    pub assert_content: bool,
    /// Treatment of extension-typed values by `type`
    pub extension_types: ExtensionTypePolicy,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            default_draft: Draft::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            assert_content: false,
            extension_types: ExtensionTypePolicy::default(),
        }
    }
}

impl CompilerOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialect used when `$schema` is absent.
    pub fn with_default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    /// Set the maximum nesting of schema applications.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable content assertions for newer dialects.
    pub fn with_assert_content(mut self, assert_content: bool) -> Self {
        self.assert_content = assert_content;
        self
    }

    /// Set how extension-typed values meet `type`.
    pub fn with_extension_types(mut self, policy: ExtensionTypePolicy) -> Self {
        self.extension_types = policy;
        self
    }

    /// Whether content keywords are asserted for a node of `draft`.
    pub(crate) fn asserts_content(&self, draft: Draft) -> bool {
        draft <= Draft::V7 || self.assert_content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.default_draft, Draft::V2020_12);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!options.assert_content);
        assert_eq!(options.extension_types, ExtensionTypePolicy::Explicit);
    }

    #[test]
    fn test_content_assertion_by_draft() {
        let options = CompilerOptions::new();
        assert!(options.asserts_content(Draft::V7));
        assert!(!options.asserts_content(Draft::V2020_12));
        assert!(
            options
                .with_assert_content(true)
                .asserts_content(Draft::V2020_12)
        );
    }

    #[test]
    fn test_partial_deserialization() {
        let options: CompilerOptions =
            serde_json::from_str(r#"{"default_draft": "draft7", "extension_types": "implicit"}"#)
                .unwrap();
        assert_eq!(options.default_draft, Draft::V7);
        assert_eq!(options.extension_types, ExtensionTypePolicy::Implicit);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }
}
