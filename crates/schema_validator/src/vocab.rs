//! Keyword vocabularies.
//!
//! A [`Vocabulary`] contributes keywords beyond the standard set. It is
//! identified by URL, may carry a meta-schema that every schema object must
//! satisfy, and has a compile function that turns a schema object into an
//! [`Extension`] (or nothing, when the object does not use the vocabulary).
//!
//! Vocabularies live in a [`VocabularyRegistry`]. The process-wide registry
//! is reached through [`global_registry`]; compilers can be pointed at a
//! private one with `Compiler::with_registry`.

use crate::validator::Evaluation;
use crate::{CompileError, CompiledSchema, Compiler, Draft, ErrorKind, Result, ValidationError};
use indexmap::IndexMap;
use schema_core::{InstanceLocation, Map, Value};
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

/// Compiled form of a vocabulary's keywords on one schema node.
pub trait Extension: fmt::Debug + Send + Sync {
    /// Checks `instance`, reporting failures through `ctx`.
    fn validate(&self, ctx: &mut ValidatorContext<'_>, instance: &Value);
}

/// What a compile function knows about the node it is compiling.
#[derive(Debug, Clone, Copy)]
pub struct CompilerContext<'a> {
    location: &'a str,
    draft: Draft,
}

impl<'a> CompilerContext<'a> {
    pub(crate) fn new(location: &'a str, draft: Draft) -> Self {
        Self { location, draft }
    }

    /// Canonical location of the node.
    pub fn location(&self) -> &'a str {
        self.location
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Convenience constructor for a compile failure at this node.
    pub fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::extension(self.location, message)
    }
}

/// Turns a schema object into an extension, or `None` if it has none of the
/// vocabulary's keywords.
pub type CompileFn = fn(&CompilerContext<'_>, &Map) -> Result<Option<Box<dyn Extension>>>;

/// A registered set of extension keywords.
pub struct Vocabulary {
    url: String,
    meta_schema: Option<CompiledSchema>,
    compile: CompileFn,
}

impl Vocabulary {
    /// Creates a vocabulary, compiling its meta-schema right away.
    ///
    /// The meta-schema is compiled by a fresh compiler with no vocabularies
    /// enabled, so it may only use standard keywords.
    pub fn new<D>(url: impl Into<String>, meta_schema: D, compile: CompileFn) -> Result<Self>
    where
        D: TryInto<Value>,
        CompileError: From<D::Error>,
    {
        let url = url.into();
        let meta_schema = meta_schema.try_into()?;
        let compiled = Self::compile_meta_schema(&url, meta_schema).map_err(|source| {
            CompileError::Vocabulary {
                url: url.clone(),
                source: Box::new(source),
            }
        })?;
        Ok(Self {
            url,
            meta_schema: Some(compiled),
            compile,
        })
    }

    /// Creates a vocabulary that places no constraints on schema objects.
    pub fn without_meta_schema(url: impl Into<String>, compile: CompileFn) -> Self {
        Self {
            url: url.into(),
            meta_schema: None,
            compile,
        }
    }

    fn compile_meta_schema(url: &str, document: Value) -> Result<CompiledSchema> {
        let mut compiler = Compiler::new();
        compiler.add_resource(url, document)?;
        compiler.compile(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn meta_schema(&self) -> Option<&CompiledSchema> {
        self.meta_schema.as_ref()
    }

    /// Runs the compile function.
    pub fn compile(
        &self,
        ctx: &CompilerContext<'_>,
        obj: &Map,
    ) -> Result<Option<Box<dyn Extension>>> {
        (self.compile)(ctx, obj)
    }
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocabulary")
            .field("url", &self.url)
            .field("meta_schema", &self.meta_schema.as_ref().map(CompiledSchema::location))
            .finish()
    }
}

/// Append-only map of vocabularies keyed by URL.
#[derive(Debug, Default)]
pub struct VocabularyRegistry {
    entries: RwLock<IndexMap<String, Arc<Vocabulary>>>,
}

impl VocabularyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vocabulary; its URL must not be registered yet.
    pub fn register(&self, vocabulary: Vocabulary) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(vocabulary.url()) {
            return Err(CompileError::DuplicateVocabulary(vocabulary.url().to_string()));
        }
        debug!("Registered vocabulary {}", vocabulary.url());
        entries.insert(vocabulary.url().to_string(), Arc::new(vocabulary));
        Ok(())
    }

    pub fn lookup(&self, url: &str) -> Option<Arc<Vocabulary>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).cloned()
    }

    /// Registered URLs in registration order.
    pub fn urls(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }
}

static GLOBAL_REGISTRY: LazyLock<Arc<VocabularyRegistry>> =
    LazyLock::new(|| Arc::new(VocabularyRegistry::new()));

/// The process-wide registry used by compilers by default.
pub fn global_registry() -> Arc<VocabularyRegistry> {
    Arc::clone(&GLOBAL_REGISTRY)
}

/// Registers a vocabulary in the process-wide registry.
pub fn register_vocabulary(vocabulary: Vocabulary) -> Result<()> {
    GLOBAL_REGISTRY.register(vocabulary)
}

/// Looks up a vocabulary in the process-wide registry.
pub fn lookup_vocabulary(url: &str) -> Option<Arc<Vocabulary>> {
    GLOBAL_REGISTRY.lookup(url)
}

/// Handle given to extensions while they validate one node.
pub struct ValidatorContext<'a> {
    eval: &'a mut Evaluation,
    location: &'a str,
    instance_location: &'a InstanceLocation,
}

impl<'a> ValidatorContext<'a> {
    pub(crate) fn new(
        eval: &'a mut Evaluation,
        location: &'a str,
        instance_location: &'a InstanceLocation,
    ) -> Self {
        Self {
            eval,
            location,
            instance_location,
        }
    }

    /// Canonical location of the node being validated.
    pub fn schema_location(&self) -> &str {
        self.location
    }

    pub fn instance_location(&self) -> &InstanceLocation {
        self.instance_location
    }

    /// Marks an object member as evaluated for `unevaluatedProperties`.
    pub fn mark_property_evaluated(&mut self, name: &str) {
        self.eval.uneval.props.remove(name);
    }

    /// Marks an array element as evaluated for `unevaluatedItems`.
    pub fn mark_item_evaluated(&mut self, index: usize) {
        self.eval.uneval.items.remove(&index);
    }

    /// Reports a leaf error at the current node and instance location.
    pub fn report_error(&mut self, kind: ErrorKind) {
        let err = ValidationError::new(self.location, self.instance_location, kind);
        self.eval.errors.push(err);
    }

    /// Reports a composite error wrapping `causes`.
    pub fn report_errors(&mut self, kind: ErrorKind, causes: Vec<ValidationError>) {
        let err = ValidationError::new(self.location, self.instance_location, kind);
        self.eval.errors.push(err.with_causes(causes));
    }

    /// Reports an error as is.
    pub fn report_raw(&mut self, err: ValidationError) {
        self.eval.errors.push(err);
    }

    /// Structural equality; a comparator failure becomes a ready-to-report
    /// error attributed to `keyword`.
    pub fn equals(
        &self,
        keyword: &str,
        a: &Value,
        b: &Value,
    ) -> std::result::Result<bool, ValidationError> {
        schema_core::equals(a, b).map_err(|e| self.incomparable(keyword, e))
    }

    /// First duplicate pair in `values`; see [`schema_core::duplicates`].
    pub fn duplicates(
        &self,
        keyword: &str,
        values: &[Value],
    ) -> std::result::Result<Option<(usize, usize)>, ValidationError> {
        schema_core::duplicates(values).map_err(|e| self.incomparable(keyword, e))
    }

    fn incomparable(&self, keyword: &str, err: schema_core::ValueError) -> ValidationError {
        let kind = ErrorKind::Incomparable {
            keyword: keyword.to_string(),
            reason: err.to_string(),
        };
        ValidationError::new(self.location, self.instance_location, kind)
    }
}
