//! Schema resources inside a document.
//!
//! A document is one resource, plus one more for every subschema that sets
//! an identifier. Each resource has its own base URI, dialect and anchor
//! table. Positions are JSON pointers into the physical document.

use crate::{CompileError, Draft, Result};
use schema_core::{Map, Value};
use schema_loader::strip_fragment;
use std::collections::HashMap;
use url::Url;

/// One schema resource.
#[derive(Debug, Clone)]
pub(crate) struct Resource {
    /// Base URI, without fragment
    pub id: Url,
    /// Position of the resource root in the document
    pub pointer: String,
    pub draft: Draft,
    /// Anchor name to position
    pub anchors: HashMap<String, String>,
    /// Dynamic anchor name to position
    pub dynamic_anchors: HashMap<String, String>,
}

impl Resource {
    fn new(id: Url, pointer: String, draft: Draft) -> Self {
        Self {
            id,
            pointer,
            draft,
            anchors: HashMap::new(),
            dynamic_anchors: HashMap::new(),
        }
    }
}

/// Resources of one document; the first entry is the document root.
#[derive(Debug, Clone)]
pub(crate) struct DocIndex {
    pub resources: Vec<Resource>,
}

impl DocIndex {
    /// Walks a document and records its resources and anchors.
    pub fn build(url: &Url, doc: &Value, default_draft: Draft) -> Result<Self> {
        let location = format!("{url}#");
        let draft = match doc.get("$schema") {
            Some(schema) => draft_of(&location, schema)?,
            None => default_draft,
        };
        let id = match doc.as_object().and_then(|obj| identifier(obj, draft)) {
            Some(id) => join(url, id, &location)?,
            None => url.clone(),
        };

        let mut index = Self {
            resources: vec![Resource::new(strip_fragment(&id), String::new(), draft)],
        };
        index.walk(url, doc, String::new(), 0)?;
        Ok(index)
    }

    /// Innermost resource enclosing `pointer`.
    pub fn resource_for(&self, pointer: &str) -> &Resource {
        self.resources
            .iter()
            .filter(|res| encloses(&res.pointer, pointer))
            .max_by_key(|res| res.pointer.len())
            .unwrap_or(&self.resources[0])
    }

    /// Resource rooted exactly at `pointer`.
    pub fn resource_at(&self, pointer: &str) -> Option<&Resource> {
        self.resources.iter().find(|res| res.pointer == pointer)
    }

    fn walk(&mut self, doc_url: &Url, value: &Value, pointer: String, resource: usize) -> Result<()> {
        let Value::Object(obj) = value else {
            return Ok(());
        };
        let mut resource = resource;
        let mut draft = self.resources[resource].draft;
        let location = format!("{doc_url}#{pointer}");
        let hides_siblings = draft.ref_overrides_siblings() && obj.contains_key("$ref");

        if !pointer.is_empty() && !hides_siblings {
            if let Some(id) = identifier(obj, draft) {
                let base = self.resources[resource].id.clone();
                let url = strip_fragment(&join(&base, id, &location)?);
                if self.resources.iter().any(|res| res.id == url) {
                    return Err(CompileError::DuplicateId {
                        location: doc_url.to_string(),
                        id: url.to_string(),
                    });
                }
                if let Some(schema) = obj.get("$schema") {
                    draft = draft_of(&location, schema)?;
                }
                self.resources.push(Resource::new(url, pointer.clone(), draft));
                resource = self.resources.len() - 1;
            }
        }

        if draft <= Draft::V7 && !hides_siblings {
            // Plain-name fragment in `$id`/`id` acts as an anchor.
            if let Some(fragment) = obj
                .get(draft.id_keyword())
                .and_then(Value::as_str)
                .and_then(|id| id.split_once('#'))
                .map(|(_, fragment)| fragment)
                .filter(|fragment| !fragment.is_empty() && !fragment.starts_with('/'))
            {
                self.add_anchor(resource, fragment, &pointer, false)?;
            }
        }
        if draft.supports("$anchor") {
            if let Some(anchor) = obj.get("$anchor").and_then(Value::as_str) {
                self.add_anchor(resource, anchor, &pointer, false)?;
            }
        }
        if draft.supports("$dynamicAnchor") {
            if let Some(anchor) = obj.get("$dynamicAnchor").and_then(Value::as_str) {
                self.add_anchor(resource, anchor, &pointer, true)?;
            }
        }

        for (suffix, child) in draft.subschemas(obj) {
            self.walk(doc_url, child, format!("{pointer}/{suffix}"), resource)?;
        }
        Ok(())
    }

    fn add_anchor(&mut self, resource: usize, name: &str, pointer: &str, dynamic: bool) -> Result<()> {
        let res = &mut self.resources[resource];
        if res.anchors.contains_key(name) {
            return Err(CompileError::DuplicateAnchor {
                resource: res.id.to_string(),
                anchor: name.to_string(),
            });
        }
        res.anchors.insert(name.to_string(), pointer.to_string());
        if dynamic {
            res.dynamic_anchors.insert(name.to_string(), pointer.to_string());
        }
        Ok(())
    }
}

/// Identifier that opens a new resource, if any.
///
/// In drafts up to 7 an `$id` consisting of a fragment only is an anchor,
/// not a resource.
fn identifier(obj: &Map, draft: Draft) -> Option<&str> {
    let id = obj.get(draft.id_keyword())?.as_str()?;
    if id.starts_with('#') { None } else { Some(id) }
}

fn join(base: &Url, reference: &str, location: &str) -> Result<Url> {
    base.join(reference)
        .map_err(|e| CompileError::invalid_keyword(location, "$id", e.to_string()))
}

fn draft_of(location: &str, schema: &Value) -> Result<Draft> {
    let url = schema
        .as_str()
        .ok_or_else(|| CompileError::invalid_keyword(location, "$schema", "must be a string"))?;
    Draft::from_url(url).ok_or_else(|| CompileError::UnknownDraft {
        location: location.to_string(),
        url: url.to_string(),
    })
}

/// True if `outer` is `inner` or one of its ancestors, on token boundaries.
fn encloses(outer: &str, inner: &str) -> bool {
    inner == outer
        || (inner.starts_with(outer) && inner.as_bytes().get(outer.len()) == Some(&b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn index(doc: serde_json::Value) -> Result<DocIndex> {
        let url = Url::parse("https://example.com/root.json").unwrap();
        DocIndex::build(&url, &Value::try_from(doc).unwrap(), Draft::V2020_12)
    }

    #[test]
    fn test_embedded_resources_and_anchors() {
        let idx = index(json!({
            "$defs": {
                "node": {
                    "$id": "node.json",
                    "$dynamicAnchor": "tree",
                    "properties": {"child": {"$anchor": "child"}}
                },
                "named": {"$anchor": "named"}
            }
        }))
        .unwrap();

        assert_eq!(idx.resources.len(), 2);
        assert_eq!(idx.resources[0].anchors.get("named").unwrap(), "/$defs/named");

        let node = idx.resource_at("/$defs/node").unwrap();
        assert_eq!(node.id.as_str(), "https://example.com/node.json");
        assert_eq!(node.dynamic_anchors.get("tree").unwrap(), "/$defs/node");
        assert_eq!(
            node.anchors.get("child").unwrap(),
            "/$defs/node/properties/child"
        );

        let inner = idx.resource_for("/$defs/node/properties/child");
        assert_eq!(inner.pointer, "/$defs/node");
        assert_eq!(idx.resource_for("/$defs/nodes").pointer, "");
    }

    #[test]
    fn test_duplicate_anchor() {
        let err = index(json!({
            "$defs": {"a": {"$anchor": "x"}, "b": {"$anchor": "x"}}
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateAnchor { ref anchor, .. } if anchor == "x"));
    }

    #[test]
    fn test_duplicate_id() {
        let err = index(json!({
            "$defs": {"a": {"$id": "same.json"}, "b": {"$id": "same.json"}}
        }))
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateId { .. }));
    }

    #[test]
    fn test_draft7_fragment_id_is_anchor() {
        let idx = index(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"a": {"$id": "#foo"}}
        }))
        .unwrap();
        assert_eq!(idx.resources.len(), 1);
        assert_eq!(idx.resources[0].draft, Draft::V7);
        assert_eq!(idx.resources[0].anchors.get("foo").unwrap(), "/definitions/a");
    }

    #[test]
    fn test_unknown_meta_schema() {
        let err = index(json!({"$schema": "https://example.com/custom"})).unwrap_err();
        assert!(matches!(err, CompileError::UnknownDraft { .. }));
    }
}
