//! Resource loaders.

use crate::{LoadError, Result, parse_file, parse_json, parse_yaml, strip_fragment, to_url};
use schema_core::Value;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Source of raw schema documents.
///
/// The compiler calls `load` at most once per resource URL (without
/// fragment) and caches the result itself, so loaders do not need to cache.
pub trait ResourceLoader: Send + Sync {
    /// Loads and decodes the document behind `url`.
    fn load(&self, url: &Url) -> Result<Value>;
}

/// Loader backed by an in-memory map of documents.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    resources: HashMap<Url, Value>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already decoded document.
    ///
    /// A relative location is resolved the same way [`to_url`] resolves it.
    pub fn add_resource<D>(&mut self, location: &str, document: D) -> Result<()>
    where
        D: TryInto<Value>,
        LoadError: From<D::Error>,
    {
        let url = strip_fragment(&to_url(location)?);
        let document = document.try_into()?;
        debug!("Registering in-memory resource {}", url);
        self.resources.insert(url, document);
        Ok(())
    }

    /// Adds a document given as JSON text.
    pub fn add_json(&mut self, location: &str, content: &str) -> Result<()> {
        let document = parse_json(content)?;
        self.add_resource(location, document)
    }

    /// Adds a document given as YAML text.
    pub fn add_yaml(&mut self, location: &str, content: &str) -> Result<()> {
        let document = parse_yaml(content)?;
        self.add_resource(location, document)
    }

    /// Returns true if a document is registered under `url`.
    pub fn contains(&self, url: &Url) -> bool {
        self.resources.contains_key(&strip_fragment(url))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, url: &Url) -> Result<Value> {
        self.resources
            .get(&strip_fragment(url))
            .cloned()
            .ok_or_else(|| LoadError::NotFound(url.to_string()))
    }
}

/// Loader for `file://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ResourceLoader for FileLoader {
    fn load(&self, url: &Url) -> Result<Value> {
        if url.scheme() != "file" {
            return Err(LoadError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            });
        }
        let path = url
            .to_file_path()
            .map_err(|_| LoadError::invalid_location(url.as_str(), "not a local file path"))?;
        debug!("Loading schema resource from {}", path.display());
        parse_file(&path)
    }
}

/// Tries several loaders in order.
///
/// A "not found" answer (including an unsupported scheme) falls through to
/// the next loader; any other error is returned immediately.
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl ChainLoader {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loader to the chain.
    pub fn with(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Appends a boxed loader to the chain.
    pub fn push(&mut self, loader: Box<dyn ResourceLoader>) {
        self.loaders.push(loader);
    }
}

impl ResourceLoader for ChainLoader {
    fn load(&self, url: &Url) -> Result<Value> {
        for loader in &self.loaders {
            match loader.load(url) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_not_found() => continue,
                Err(LoadError::UnsupportedScheme { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(LoadError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_memory_loader_roundtrip() {
        let mut loader = MemoryLoader::new();
        loader
            .add_resource("https://example.com/a.json", json!({"type": "null"}))
            .unwrap();

        let url = to_url("https://example.com/a.json#/type").unwrap();
        assert!(loader.contains(&url));
        assert_eq!(loader.load(&url).unwrap(), Value::try_from(json!({"type": "null"})).unwrap());
    }

    #[test]
    fn test_memory_loader_missing() {
        let loader = MemoryLoader::new();
        let url = to_url("https://example.com/missing.json").unwrap();
        assert!(matches!(loader.load(&url), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_file_loader_rejects_http() {
        let url = to_url("https://example.com/a.json").unwrap();
        assert!(matches!(
            FileLoader.load(&url),
            Err(LoadError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_chain_falls_through() {
        let mut second = MemoryLoader::new();
        second
            .add_resource("https://example.com/b.json", json!(true))
            .unwrap();
        let chain = ChainLoader::new()
            .with(MemoryLoader::new())
            .with(FileLoader)
            .with(second);

        let url = to_url("https://example.com/b.json").unwrap();
        assert_eq!(chain.load(&url).unwrap(), Value::Bool(true));

        let missing = to_url("https://example.com/c.json").unwrap();
        assert!(matches!(chain.load(&missing), Err(LoadError::NotFound(_))));
    }
}
