//! Schema dialects and the keywords each one understands.

use schema_core::{Map, Value, escape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported schema dialects, oldest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Draft {
    #[serde(rename = "draft4")]
    V4,
    #[serde(rename = "draft6")]
    V6,
    #[serde(rename = "draft7")]
    V7,
    #[serde(rename = "2019-09")]
    V2019_09,
    #[default]
    #[serde(rename = "2020-12")]
    V2020_12,
}

/// How a keyword holds its subschemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// One schema
    Single,
    /// Array of schemas
    List,
    /// Object whose values are schemas
    Map,
    /// One schema or an array of schemas (`items` before 2020-12)
    SingleOrList,
    /// Object whose values are schemas or property-name arrays (`dependencies`)
    Dependencies,
}

impl Draft {
    /// All dialects, oldest first.
    pub const ALL: [Draft; 5] = [
        Draft::V4,
        Draft::V6,
        Draft::V7,
        Draft::V2019_09,
        Draft::V2020_12,
    ];

    /// Detects the dialect from a `$schema` URL.
    ///
    /// The scheme (`http`/`https`) and a trailing empty fragment are ignored.
    pub fn from_url(url: &str) -> Option<Draft> {
        let url = url.trim_end_matches('#');
        let url = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        Draft::ALL
            .into_iter()
            .find(|draft| draft.url().split_once("://").map(|(_, rest)| rest) == Some(url))
    }

    /// Canonical meta-schema URL.
    pub fn url(self) -> &'static str {
        match self {
            Draft::V4 => "http://json-schema.org/draft-04/schema",
            Draft::V6 => "http://json-schema.org/draft-06/schema",
            Draft::V7 => "http://json-schema.org/draft-07/schema",
            Draft::V2019_09 => "https://json-schema.org/draft/2019-09/schema",
            Draft::V2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Keyword that establishes a resource identifier.
    pub fn id_keyword(self) -> &'static str {
        if self == Draft::V4 { "id" } else { "$id" }
    }

    /// Whether a `$ref` hides its sibling keywords.
    pub fn ref_overrides_siblings(self) -> bool {
        self <= Draft::V7
    }

    /// Returns true if the keyword has meaning in this dialect.
    ///
    /// Unknown keywords return true; they are simply never read.
    pub fn supports(self, keyword: &str) -> bool {
        match keyword {
            "const" | "contains" | "propertyNames" | "examples" => self >= Draft::V6,
            "if" | "then" | "else" | "contentEncoding" | "contentMediaType" | "$comment"
            | "readOnly" | "writeOnly" => self >= Draft::V7,
            "$defs" | "$anchor" | "dependentRequired" | "dependentSchemas"
            | "unevaluatedProperties" | "unevaluatedItems" | "minContains" | "maxContains"
            | "contentSchema" | "deprecated" => self >= Draft::V2019_09,
            "$recursiveRef" | "$recursiveAnchor" => self == Draft::V2019_09,
            "prefixItems" | "$dynamicRef" | "$dynamicAnchor" => self >= Draft::V2020_12,
            "additionalItems" => self <= Draft::V2019_09,
            "dependencies" => self <= Draft::V7,
            _ => true,
        }
    }

    /// How `keyword` holds subschemas in this dialect, if it does.
    pub(crate) fn shape(self, keyword: &str) -> Option<Shape> {
        if !self.supports(keyword) {
            return None;
        }
        let shape = match keyword {
            "not" | "additionalProperties" | "additionalItems" | "if" | "then" | "else"
            | "contains" | "propertyNames" | "unevaluatedProperties" | "unevaluatedItems"
            | "contentSchema" => Shape::Single,
            "items" if self <= Draft::V2019_09 => Shape::SingleOrList,
            "items" => Shape::Single,
            "allOf" | "anyOf" | "oneOf" | "prefixItems" => Shape::List,
            "properties" | "patternProperties" | "definitions" | "$defs" | "dependentSchemas" => {
                Shape::Map
            }
            "dependencies" => Shape::Dependencies,
            _ => return None,
        };
        Some(shape)
    }

    /// Lists the subschemas of a schema object as (pointer suffix, value).
    ///
    /// Suffixes are escaped reference tokens joined by `/`, without the
    /// leading slash.
    pub(crate) fn subschemas<'v>(self, obj: &'v Map) -> Vec<(String, &'v Value)> {
        let mut out = Vec::new();
        for (keyword, value) in obj {
            let Some(shape) = self.shape(keyword) else {
                continue;
            };
            let kw = escape(keyword);
            match (shape, value) {
                (Shape::List | Shape::SingleOrList, Value::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        out.push((format!("{kw}/{i}"), item));
                    }
                }
                (Shape::Single | Shape::SingleOrList, _) => out.push((kw, value)),
                (Shape::Map, Value::Object(members)) => {
                    for (name, member) in members {
                        out.push((format!("{kw}/{}", escape(name)), member));
                    }
                }
                (Shape::Dependencies, Value::Object(members)) => {
                    for (name, member) in members {
                        if !matches!(member, Value::Array(_)) {
                            out.push((format!("{kw}/{}", escape(name)), member));
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Draft::V4 => "draft4",
            Draft::V6 => "draft6",
            Draft::V7 => "draft7",
            Draft::V2019_09 => "2019-09",
            Draft::V2020_12 => "2020-12",
        };
        f.write_str(name)
    }
}
