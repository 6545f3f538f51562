//! Canonical representation of schema documents and instance values.
//!
//! `Value` is a JSON-like tree with two differences from `serde_json::Value`:
//! numbers are exact decimals, and values can carry a logical type that is
//! not one of the JSON kinds (calendar dates, timestamps, or any type exposed
//! through the [`SchemaTyped`] capability).

use crate::{Result, TypeTag, ValueError};
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;
use num_traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Insertion-ordered object representation.
pub type Map = IndexMap<String, Value>;

/// Capability for values that declare their own schema type.
///
/// Implementors report a type name (for example `"money"`) which is looked
/// up in the type registry. A name that was never registered leaves the value
/// without a type tag, so it fails every declared type check.
pub trait SchemaTyped: fmt::Debug + Send + Sync {
    /// Declared type name.
    fn schema_type(&self) -> &str;

    /// Canonical projection used for equality and duplicate detection.
    ///
    /// Values returning `None` cannot be compared; comparing them is an error.
    fn canonical(&self) -> Option<Value> {
        None
    }
}

/// A value in a schema document or an instance.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,
    /// JSON boolean
    Bool(bool),
    /// Exact decimal number
    Number(BigDecimal),
    /// UTF-8 string
    String(String),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Insertion-ordered map
    Object(Map),
    /// Calendar date (extension type `date`)
    Date(NaiveDate),
    /// Timestamp with offset (extension type `date-time`)
    DateTime(DateTime<FixedOffset>),
    /// Value with a declared schema type
    Custom(Arc<dyn SchemaTyped>),
}

impl Value {
    /// Classifies the value into its type tag.
    ///
    /// Numbers always report `number`; integrality is checked separately with
    /// [`Value::is_integer`]. Custom values report the tag registered under
    /// their declared name, or `None` if that name is unknown.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Null => Some(TypeTag::NULL),
            Value::Bool(_) => Some(TypeTag::BOOLEAN),
            Value::Number(_) => Some(TypeTag::NUMBER),
            Value::String(_) => Some(TypeTag::STRING),
            Value::Array(_) => Some(TypeTag::ARRAY),
            Value::Object(_) => Some(TypeTag::OBJECT),
            Value::Date(_) => Some(TypeTag::DATE),
            Value::DateTime(_) => Some(TypeTag::DATE_TIME),
            Value::Custom(custom) => TypeTag::from_name(custom.schema_type()),
        }
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Custom(custom) => custom.schema_type().to_string(),
            other => other
                .type_tag()
                .map(|tag| tag.name().to_string())
                .unwrap_or_else(|| "invalid".to_string()),
        }
    }

    /// Returns true for numbers without a fractional part.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_integer())
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the number as a non-negative integer, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) if n.is_integer() => n.to_u64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Converts a float through its shortest decimal rendering.
    ///
    /// Returns `None` for NaN and infinities, which have no JSON form.
    pub fn from_f64(f: f64) -> Option<Value> {
        if !f.is_finite() {
            return None;
        }
        BigDecimal::from_str(&f.to_string()).ok().map(Value::Number)
    }

    /// Converts to a `serde_json::Value`.
    ///
    /// Dates are rendered in ISO 8601; custom values use their canonical
    /// projection, or null when they have none.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_str(&n.to_string())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Date(date) => serde_json::Value::String(date.format("%Y-%m-%d").to_string()),
            Value::DateTime(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Custom(custom) => custom
                .canonical()
                .map(|v| v.to_json())
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; incomparable values are never equal.
    fn eq(&self, other: &Self) -> bool {
        crate::equals(self, other).unwrap_or(false)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Custom(custom) => write!(f, "<{}>", custom.schema_type()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ValueError;

    /// Converts a decoded JSON tree.
    ///
    /// Fails on number text whose exponent does not fit an exact decimal.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                let text = n.to_string();
                match BigDecimal::from_str(&text) {
                    Ok(number) => Value::Number(number),
                    Err(_) => return Err(ValueError::InvalidNumber(text)),
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_>>()?,
            ),
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = ValueError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        Value::try_from(value.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(BigDecimal::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(BigDecimal::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Number(BigDecimal::from(u))
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::DateTime(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::DateTime(ts.fixed_offset())
    }
}

impl<T: SchemaTyped + 'static> From<Arc<T>> for Value {
    fn from(custom: Arc<T>) -> Self {
        Value::Custom(custom)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug)]
    struct Unregistered;

    impl SchemaTyped for Unregistered {
        fn schema_type(&self) -> &str {
            "never-registered"
        }
    }

    #[test]
    fn test_unrepresentable_number_is_an_error() {
        let json: serde_json::Value = serde_json::from_str("[1e99999999999999999999]").unwrap();
        assert_eq!(
            Value::try_from(json),
            Err(ValueError::InvalidNumber("1e99999999999999999999".to_string()))
        );
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::Null.type_tag(), Some(TypeTag::NULL));
        assert_eq!(Value::from(1).type_tag(), Some(TypeTag::NUMBER));
        assert_eq!(Value::from("x").type_tag(), Some(TypeTag::STRING));
        assert_eq!(Value::try_from(json!([1])).unwrap().type_tag(), Some(TypeTag::ARRAY));
        assert_eq!(Value::try_from(json!({})).unwrap().type_tag(), Some(TypeTag::OBJECT));
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::from(date).type_tag(), Some(TypeTag::DATE));
        assert_eq!(Value::from(Utc::now()).type_tag(), Some(TypeTag::DATE_TIME));
    }

    #[test]
    fn test_unregistered_custom_type_has_no_tag() {
        let value = Value::Custom(Arc::new(Unregistered));
        assert_eq!(value.type_tag(), None);
        assert_eq!(value.type_name(), "never-registered");
    }

    #[test]
    fn test_integer_detection() {
        assert!(Value::try_from(json!(3)).unwrap().is_integer());
        assert!(Value::try_from(json!(3.0)).unwrap().is_integer());
        assert!(!Value::try_from(json!(3.5)).unwrap().is_integer());
        assert!(!Value::from("3").is_integer());
    }

    #[test]
    fn test_numbers_are_exact() {
        let value = Value::try_from(json!(0.1)).unwrap();
        assert_eq!(
            value.as_number(),
            Some(&BigDecimal::from_str("0.1").unwrap())
        );
        assert_eq!(Value::from_f64(0.3), Some(Value::try_from(json!(0.3)).unwrap()));
        assert_eq!(Value::from_f64(f64::NAN), None);
    }

    #[test]
    fn test_object_order_is_preserved() {
        let value = Value::try_from(json!({"b": 1, "a": 2, "c": 3})).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_to_json_roundtrip_of_plain_json() {
        let doc = json!({"a": [1, 2.5, null, true], "b": {"c": "d"}});
        assert_eq!(Value::try_from(doc.clone()).unwrap().to_json(), doc);
    }

    #[test]
    fn test_date_to_json() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::from(date).to_json(), json!("2024-01-15"));
    }

    #[test]
    fn test_as_u64() {
        assert_eq!(Value::try_from(json!(5)).unwrap().as_u64(), Some(5));
        assert_eq!(Value::try_from(json!(-5)).unwrap().as_u64(), None);
        assert_eq!(Value::try_from(json!(5.5)).unwrap().as_u64(), None);
    }
}
