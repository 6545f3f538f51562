//! Structural equality and duplicate detection.
//!
//! Numbers compare by exact value (`1`, `1.0` and `1e0` are equal), objects
//! compare by key set and values regardless of key order, arrays compare in
//! order. Custom values compare through their canonical projection.

use crate::{Result, Value, ValueError};
use std::borrow::Cow;

/// Deep structural equality between two values.
///
/// Fails if either operand contains a custom value that cannot be
/// interpreted, i.e. one whose type is unknown or that has no canonical
/// projection.
pub fn equals(a: &Value, b: &Value) -> Result<bool> {
    let a = project(a)?;
    let b = project(b)?;

    let equal = match (a.as_ref(), b.as_ref()) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::DateTime(x), Value::DateTime(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys) {
                if !equals(x, y)? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Object(xs), Value::Object(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (key, x) in xs {
                match ys.get(key) {
                    Some(y) if equals(x, y)? => {}
                    _ => return Ok(false),
                }
            }
            true
        }
        _ => {
            // Different kinds are unequal, but nested custom values must still
            // be interpretable.
            check_comparable(&a)?;
            check_comparable(&b)?;
            false
        }
    };

    Ok(equal)
}

/// Finds the first pair of equal elements.
///
/// Pairs are ordered by their second index, then by their first, so
/// `[1, 2, 1]` yields `Some((0, 2))`. Returns `None` when all elements are
/// distinct.
pub fn duplicates(values: &[Value]) -> Result<Option<(usize, usize)>> {
    for j in 1..values.len() {
        for i in 0..j {
            if equals(&values[i], &values[j])? {
                return Ok(Some((i, j)));
            }
        }
    }
    Ok(None)
}

fn project(value: &Value) -> Result<Cow<'_, Value>> {
    match value {
        Value::Custom(custom) => {
            if value.type_tag().is_none() {
                return Err(ValueError::incomparable(custom.schema_type()));
            }
            let canonical = custom
                .canonical()
                .ok_or_else(|| ValueError::incomparable(custom.schema_type()))?;
            if matches!(canonical, Value::Custom(_)) {
                return Err(ValueError::incomparable(custom.schema_type()));
            }
            Ok(Cow::Owned(canonical))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

fn check_comparable(value: &Value) -> Result<()> {
    match value {
        Value::Custom(_) => project(value).map(|_| ()),
        Value::Array(items) => items.iter().try_for_each(check_comparable),
        Value::Object(map) => map.values().try_for_each(check_comparable),
        _ => Ok(()),
    }
}
