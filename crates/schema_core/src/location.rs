//! JSON pointers and instance locations.

use crate::{Result, Value, ValueError};
use std::fmt;

/// A segment of an instance location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property
    Property(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(&escape(name)),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Location of a value inside an instance, rendered as a JSON pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstanceLocation(Vec<PathSegment>);

impl InstanceLocation {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new location extended by one property.
    pub fn property(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Property(name.into()));
        Self(segments)
    }

    /// Returns a new location extended by one index.
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(idx));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Nesting depth; zero for the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InstanceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Escapes a single JSON-pointer reference token.
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescapes a single JSON-pointer reference token.
pub fn unescape(token: &str) -> Result<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(ValueError::InvalidPointer(token.to_string())),
        }
    }
    Ok(out)
}

/// Splits a JSON pointer into unescaped reference tokens.
///
/// The empty pointer addresses the whole document and yields no tokens.
pub fn split_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| ValueError::InvalidPointer(pointer.to_string()))?;
    rest.split('/').map(unescape).collect()
}

/// Resolves a JSON pointer against a value.
pub fn resolve_pointer<'v>(root: &'v Value, pointer: &str) -> Result<Option<&'v Value>> {
    let mut current = root;
    for token in split_pointer(pointer)? {
        let next = match current {
            Value::Object(map) => map.get(&token),
            Value::Array(items) => token
                .parse::<usize>()
                .ok()
                .filter(|_| token == "0" || !token.starts_with('0'))
                .and_then(|idx| items.get(idx)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}
