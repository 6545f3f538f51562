//! Extensible type system.
//!
//! A [`TypeTag`] names one member of the type universe: the seven JSON type
//! names plus extension types registered at runtime. A [`TypeSet`] is a bitset
//! over tags. The tag table is process-wide and append-only, so a tag handed
//! out once stays valid for the life of the process.

use crate::{Result, ValueError};
use std::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

/// Upper bound on the number of tags; one bit per tag in a `u64`.
pub const MAX_TYPES: usize = 64;

const JSON_TYPE_NAMES: [&str; 7] = [
    "null", "boolean", "number", "integer", "string", "array", "object",
];

static TYPE_NAMES: LazyLock<RwLock<Vec<&'static str>>> = LazyLock::new(|| {
    let mut names = JSON_TYPE_NAMES.to_vec();
    names.push("date");
    names.push("date-time");
    RwLock::new(names)
});

/// A single member of the type universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(u8);

impl TypeTag {
    pub const NULL: TypeTag = TypeTag(0);
    pub const BOOLEAN: TypeTag = TypeTag(1);
    pub const NUMBER: TypeTag = TypeTag(2);
    pub const INTEGER: TypeTag = TypeTag(3);
    pub const STRING: TypeTag = TypeTag(4);
    pub const ARRAY: TypeTag = TypeTag(5);
    pub const OBJECT: TypeTag = TypeTag(6);
    /// Calendar date extension type.
    pub const DATE: TypeTag = TypeTag(7);
    /// Date and time extension type.
    pub const DATE_TIME: TypeTag = TypeTag(8);

    /// Looks up the tag registered under `name`.
    ///
    /// `datetime` is accepted as an alias of `date-time`.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        let name = if name == "datetime" { "date-time" } else { name };
        let names = TYPE_NAMES.read().unwrap_or_else(PoisonError::into_inner);
        names
            .iter()
            .position(|n| *n == name)
            .map(|idx| TypeTag(idx as u8))
    }

    /// Returns the canonical name of this tag.
    pub fn name(self) -> &'static str {
        let names = TYPE_NAMES.read().unwrap_or_else(PoisonError::into_inner);
        names.get(self.0 as usize).copied().unwrap_or("invalid")
    }

    /// Returns true for tags outside the seven JSON types.
    pub fn is_extension(self) -> bool {
        self.0 as usize >= JSON_TYPE_NAMES.len()
    }

    /// Position of this tag in the type table.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registers an extension type name and returns its tag.
///
/// Registering a name that already exists returns the existing tag, so
/// vocabularies can call this unconditionally during setup.
pub fn register_type(name: &str) -> Result<TypeTag> {
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(ValueError::InvalidTypeName(name.to_string()));
    }
    if let Some(tag) = TypeTag::from_name(name) {
        return Ok(tag);
    }

    let mut names = TYPE_NAMES.write().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have won the race between the read above and this write.
    if let Some(idx) = names.iter().position(|n| *n == name) {
        return Ok(TypeTag(idx as u8));
    }
    if names.len() >= MAX_TYPES {
        return Err(ValueError::TypeRegistryFull(names.len()));
    }
    names.push(Box::leak(name.to_string().into_boxed_str()));
    Ok(TypeTag((names.len() - 1) as u8))
}

/// A set of type tags.
///
/// `TypeSet::default()` is the empty set. Schemas that declare no `type` hold
/// `None` instead of an empty set; an empty set admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeSet(u64);

impl TypeSet {
    /// Creates an empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from type names, failing on the first unknown name.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut set = Self::empty();
        for name in names {
            let tag = TypeTag::from_name(name).ok_or_else(|| ValueError::unknown_type(name))?;
            set.insert(tag);
        }
        Ok(set)
    }

    /// Adds a tag to the set.
    pub fn insert(&mut self, tag: TypeTag) {
        self.0 |= tag.bit();
    }

    /// Returns a copy of the set with `tag` added.
    pub fn with(mut self, tag: TypeTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the two sets share at least one tag.
    pub fn intersects(&self, other: &TypeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates member tags in tag order.
    pub fn iter(&self) -> impl Iterator<Item = TypeTag> + '_ {
        (0..MAX_TYPES as u8)
            .map(TypeTag)
            .filter(move |tag| self.contains(*tag))
    }

    /// Canonical names of the member tags, in tag order.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(TypeTag::name).collect()
    }
}

impl FromIterator<TypeTag> for TypeSet {
    fn from_iter<T: IntoIterator<Item = TypeTag>>(iter: T) -> Self {
        let mut set = Self::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_json_type_names() {
        assert_eq!(TypeTag::from_name("null"), Some(TypeTag::NULL));
        assert_eq!(TypeTag::from_name("integer"), Some(TypeTag::INTEGER));
        assert_eq!(TypeTag::from_name("object"), Some(TypeTag::OBJECT));
        assert_eq!(TypeTag::from_name("nope"), None);
        assert_eq!(TypeTag::STRING.name(), "string");
    }

    #[test]
    fn test_date_time_alias() {
        assert_eq!(TypeTag::from_name("datetime"), Some(TypeTag::DATE_TIME));
        assert_eq!(TypeTag::DATE_TIME.name(), "date-time");
        assert!(TypeTag::DATE.is_extension());
        assert!(!TypeTag::ARRAY.is_extension());
    }

    #[test]
    fn test_register_type_is_idempotent() {
        let first = register_type("money").unwrap();
        let second = register_type("money").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "money");
        assert!(first.is_extension());
    }

    #[test]
    fn test_register_type_rejects_bad_names() {
        assert!(matches!(
            register_type(""),
            Err(ValueError::InvalidTypeName(_))
        ));
        assert!(matches!(
            register_type("two words"),
            Err(ValueError::InvalidTypeName(_))
        ));
    }

    #[test]
    fn test_from_names_unknown() {
        let err = TypeSet::from_names(["string", "bogus"]).unwrap_err();
        assert_eq!(err, ValueError::UnknownType("bogus".to_string()));
    }

    #[test]
    fn test_empty_set_is_not_unconstrained() {
        let set = TypeSet::empty();
        assert!(set.is_empty());
        assert!(!set.contains(TypeTag::NULL));
        assert_eq!(set.names(), Vec::<&str>::new());
    }

    #[test]
    fn test_display() {
        let set = TypeSet::from_names(["string", "null"]).unwrap();
        assert_eq!(set.to_string(), "[null, string]");
        assert_eq!(set.len(), 2);
    }

    const NAMES: [&str; 9] = [
        "null",
        "boolean",
        "number",
        "integer",
        "string",
        "array",
        "object",
        "date",
        "date-time",
    ];

    proptest! {
        /// A name is listed by `names()` exactly when its tag is a member.
        #[test]
        fn names_agree_with_contains(
            members in prop::collection::vec(0usize..NAMES.len(), 0..9),
            probe in 0usize..NAMES.len(),
        ) {
            let set = TypeSet::from_names(members.iter().map(|i| NAMES[*i])).unwrap();
            let name = NAMES[probe];
            let tag = TypeTag::from_name(name).unwrap();
            prop_assert_eq!(set.names().contains(&name), set.contains(tag));
        }
    }
}
