//! Schema compiler.
//!
//! Compilation is two-phase. Every node is first allocated as a placeholder
//! keyed by its canonical location and queued; the queue is then drained,
//! populating each placeholder from its raw schema object. Subschemas and
//! reference targets are allocated on demand, so a node that refers back to
//! an ancestor (or to itself) simply receives the id of an existing
//! placeholder.

use crate::keywords::NodeBuilder;
use crate::resource::DocIndex;
use crate::schema::{Schema, SchemaGraph, SchemaId};
use crate::vocab::{Vocabulary, VocabularyRegistry, global_registry};
use crate::{CompileError, CompiledSchema, CompilerOptions, Result};
use schema_core::{Value, resolve_pointer};
use schema_loader::{FileLoader, ResourceLoader, strip_fragment, to_url};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// A loaded and indexed document.
#[derive(Debug)]
pub(crate) struct Document {
    pub value: Value,
    pub index: DocIndex,
}

/// Physical position of a schema: document URL plus JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeAddress {
    pub doc: Url,
    pub pointer: String,
}

impl NodeAddress {
    /// Canonical location string, e.g. `file:///s.json#/properties/a`.
    pub fn location(&self) -> String {
        format!("{}#{}", self.doc, self.pointer)
    }

    /// Address of a subschema below this one.
    pub fn child(&self, suffix: &str) -> NodeAddress {
        NodeAddress {
            doc: self.doc.clone(),
            pointer: format!("{}/{suffix}", self.pointer),
        }
    }
}

/// Nodes of the graph under construction.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    nodes: Vec<Schema>,
    by_location: HashMap<String, SchemaId>,
    queue: VecDeque<(SchemaId, NodeAddress)>,
}

impl GraphBuilder {
    /// Returns the id for `addr`, allocating a placeholder on first sight.
    pub fn enqueue(&mut self, addr: NodeAddress) -> SchemaId {
        let location = addr.location();
        if let Some(&id) = self.by_location.get(&location) {
            return id;
        }
        let id = SchemaId(self.nodes.len());
        self.nodes.push(Schema {
            location: location.clone(),
            ..Schema::default()
        });
        self.by_location.insert(location, id);
        self.queue.push_back((id, addr));
        id
    }
}

/// Compiles schema documents into validators.
///
/// # Example
///
/// ```rust
/// use schema_validator::Compiler;
/// use schema_core::Value;
/// use serde_json::json;
///
/// let mut compiler = Compiler::new();
/// compiler
///     .add_resource("urn:example:person", json!({
///         "type": "object",
///         "properties": {"age": {"type": "integer", "minimum": 0}},
///         "required": ["age"]
///     }))
///     .unwrap();
/// let schema = compiler.compile("urn:example:person").unwrap();
///
/// assert!(schema.is_valid(&Value::try_from(json!({"age": 7})).unwrap()));
/// assert!(!schema.is_valid(&Value::try_from(json!({"age": -1})).unwrap()));
/// ```
pub struct Compiler {
    loader: Box<dyn ResourceLoader>,
    preloaded: HashMap<Url, Value>,
    documents: HashMap<Url, Arc<Document>>,
    /// Resource URI to (document URL, resource pointer)
    resources: HashMap<Url, (Url, String)>,
    options: CompilerOptions,
    registry: Arc<VocabularyRegistry>,
    enabled: Vec<Arc<Vocabulary>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a compiler that loads `file://` resources from disk.
    pub fn new() -> Self {
        Self::with_loader(FileLoader)
    }

    /// Creates a compiler with a custom resource loader.
    pub fn with_loader(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            preloaded: HashMap::new(),
            documents: HashMap::new(),
            resources: HashMap::new(),
            options: CompilerOptions::default(),
            registry: global_registry(),
            enabled: Vec::new(),
        }
    }

    /// Set compiler options.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `registry` instead of the process-wide one.
    ///
    /// Vocabularies enabled so far are disabled.
    pub fn with_registry(mut self, registry: Arc<VocabularyRegistry>) -> Self {
        self.registry = registry;
        self.enabled.clear();
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Provides a document so that it is never fetched through the loader.
    pub fn add_resource<D>(&mut self, location: &str, document: D) -> Result<()>
    where
        D: TryInto<Value>,
        CompileError: From<D::Error>,
    {
        let document = document.try_into()?;
        let url = strip_fragment(&to_url(location).map_err(|source| CompileError::Load {
            url: location.to_string(),
            source,
        })?);
        debug!("Adding schema resource {}", url);
        self.documents.remove(&url);
        self.resources.retain(|_, (doc, _)| *doc != url);
        self.preloaded.insert(url, document);
        Ok(())
    }

    /// Enables a registered vocabulary for subsequent compilations.
    pub fn enable_vocabulary(&mut self, url: &str) -> Result<()> {
        let vocabulary = self
            .registry
            .lookup(url)
            .ok_or_else(|| CompileError::UnknownVocabulary(url.to_string()))?;
        if !self.enabled.iter().any(|v| v.url() == url) {
            debug!("Enabled vocabulary {}", url);
            self.enabled.push(vocabulary);
        }
        Ok(())
    }

    pub(crate) fn enabled_vocabularies(&self) -> Vec<Arc<Vocabulary>> {
        self.enabled.clone()
    }

    /// Compiles the schema at `location` (a URL or file path, optionally
    /// with a fragment) together with everything it references.
    pub fn compile(&mut self, location: &str) -> Result<CompiledSchema> {
        let url = to_url(location).map_err(|source| CompileError::Load {
            url: location.to_string(),
            source,
        })?;
        let root_addr = self
            .locate(&url)?
            .ok_or_else(|| CompileError::unresolved(location, url.as_str()))?;

        let mut build = GraphBuilder::default();
        let root = build.enqueue(root_addr);
        while let Some((id, addr)) = build.queue.pop_front() {
            let schema = self.populate(&mut build, &addr)?;
            trace!("Populated schema node {} at {}", id.index(), schema.location);
            build.nodes[id.index()] = schema;
        }

        debug!("Compiled {} into {} schema nodes", url, build.nodes.len());
        let graph = SchemaGraph::new(build.nodes, self.options.clone());
        Ok(CompiledSchema::new(graph, root))
    }

    fn populate(&mut self, build: &mut GraphBuilder, addr: &NodeAddress) -> Result<Schema> {
        let doc = self.load_document(&addr.doc)?;
        let location = addr.location();
        let raw = resolve_pointer(&doc.value, &addr.pointer)
            .ok()
            .flatten()
            .ok_or_else(|| CompileError::unresolved(&location, &location))?;

        let resource = doc.index.resource_for(&addr.pointer);
        let resource_id = build.enqueue(NodeAddress {
            doc: addr.doc.clone(),
            pointer: resource.pointer.clone(),
        });
        let mut schema = Schema::new(location.clone(), resource.draft, resource_id);
        if resource.pointer == addr.pointer {
            for (name, pointer) in &resource.dynamic_anchors {
                let id = build.enqueue(NodeAddress {
                    doc: addr.doc.clone(),
                    pointer: pointer.clone(),
                });
                schema.dynamic_anchors.insert(name.clone(), id);
            }
        }

        match raw {
            Value::Bool(allowed) => {
                schema.boolean = Some(*allowed);
                Ok(schema)
            }
            Value::Object(obj) => {
                let mut node = NodeBuilder {
                    compiler: self,
                    build,
                    addr,
                    base: &resource.id,
                    draft: resource.draft,
                    location: &location,
                    obj,
                };
                node.populate(&mut schema)?;
                Ok(schema)
            }
            other => Err(CompileError::invalid_keyword(
                &location,
                "",
                format!("schema must be an object or a boolean, got {}", other.type_name()),
            )),
        }
    }

    fn load_document(&mut self, url: &Url) -> Result<Arc<Document>> {
        if let Some(doc) = self.documents.get(url) {
            return Ok(Arc::clone(doc));
        }

        let value = match self.preloaded.get(url) {
            Some(value) => value.clone(),
            None => self.loader.load(url).map_err(|source| CompileError::Load {
                url: url.to_string(),
                source,
            })?,
        };
        debug!("Loaded schema resource {}", url);

        let index = DocIndex::build(url, &value, self.options.default_draft)?;
        for resource in &index.resources {
            self.resources
                .entry(resource.id.clone())
                .or_insert_with(|| (url.clone(), resource.pointer.clone()));
        }
        self.resources
            .entry(url.clone())
            .or_insert_with(|| (url.clone(), String::new()));

        let doc = Arc::new(Document { value, index });
        self.documents.insert(url.clone(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Resolves an absolute URL (with optional fragment) to a physical
    /// position, loading documents as needed.
    ///
    /// Returns `Ok(None)` when the document exists but the fragment does not
    /// lead anywhere.
    pub(crate) fn locate(&mut self, url: &Url) -> Result<Option<NodeAddress>> {
        let base = strip_fragment(url);
        if !self.resources.contains_key(&base) {
            self.load_document(&base)?;
        }
        let Some((doc_url, resource_pointer)) = self.resources.get(&base).cloned() else {
            return Ok(None);
        };
        let doc = self.load_document(&doc_url)?;

        let Ok(fragment) = urlencoding::decode(url.fragment().unwrap_or_default()) else {
            return Ok(None);
        };
        let pointer = if fragment.is_empty() {
            resource_pointer
        } else if fragment.starts_with('/') {
            format!("{resource_pointer}{fragment}")
        } else {
            let anchor = doc
                .index
                .resource_at(&resource_pointer)
                .and_then(|resource| resource.anchors.get(fragment.as_ref()));
            match anchor {
                Some(pointer) => pointer.clone(),
                None => return Ok(None),
            }
        };

        match resolve_pointer(&doc.value, &pointer) {
            Ok(Some(_)) => Ok(Some(NodeAddress {
                doc: doc_url,
                pointer,
            })),
            _ => Ok(None),
        }
    }

    /// Raw value at a physical position.
    pub(crate) fn raw_value(&mut self, addr: &NodeAddress) -> Result<Option<Value>> {
        let doc = self.load_document(&addr.doc)?;
        Ok(resolve_pointer(&doc.value, &addr.pointer)
            .ok()
            .flatten()
            .cloned())
    }
}
