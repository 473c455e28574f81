//! Value specifications for atomic matches and their normalization.
//!
//! A value spec is what a filter author writes on the right-hand side of a
//! tag match. Normalization turns it into the set of tag strings to compare
//! against:
//!
//!   true / false   -> "yes" / "no"
//!   42             -> "42"
//!   "residential"  -> "residential"
//!   null           -> absent (the key must be missing)
//!   [a, b, null]   -> each element normalized, duplicates collapse
//!   {}             -> any value (the key must be present)

use crate::error::{FilterError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Raw value specification, one variant per accepted input shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ValueSpec {
    Bool(bool),
    Int(i64),
    Str(String),
    Null,
    List(Vec<ValueSpec>),
    Object(Map<String, Value>),
    /// Anything else (floats, out-of-range integers). Always rejected.
    Unsupported(Value),
}

impl ValueSpec {
    /// The empty-object spec: match any value of a present key.
    pub fn any() -> Self {
        ValueSpec::Object(Map::new())
    }
}

impl From<Value> for ValueSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ValueSpec::Null,
            Value::Bool(b) => ValueSpec::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ValueSpec::Int(i),
                None => ValueSpec::Unsupported(Value::Number(n)),
            },
            Value::String(s) => ValueSpec::Str(s),
            Value::Array(items) => ValueSpec::List(items.into_iter().map(ValueSpec::from).collect()),
            Value::Object(map) => ValueSpec::Object(map),
        }
    }
}

impl From<&str> for ValueSpec {
    fn from(s: &str) -> Self {
        ValueSpec::Str(s.to_string())
    }
}

impl From<bool> for ValueSpec {
    fn from(b: bool) -> Self {
        ValueSpec::Bool(b)
    }
}

impl From<i64> for ValueSpec {
    fn from(i: i64) -> Self {
        ValueSpec::Int(i)
    }
}

impl<T: Into<ValueSpec>> From<Vec<T>> for ValueSpec {
    fn from(items: Vec<T>) -> Self {
        ValueSpec::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ValueSpec>> From<Option<T>> for ValueSpec {
    fn from(value: Option<T>) -> Self {
        value.map_or(ValueSpec::Null, Into::into)
    }
}

impl fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSpec::Bool(b) => write!(f, "{b}"),
            ValueSpec::Int(i) => write!(f, "{i}"),
            ValueSpec::Str(s) => write!(f, "{s:?}"),
            ValueSpec::Null => write!(f, "null"),
            ValueSpec::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ValueSpec::Object(map) => write!(f, "{}", Value::Object(map.clone())),
            ValueSpec::Unsupported(value) => write!(f, "{value}"),
        }
    }
}

/// A single normalized value. `None` marks "key absent".
pub type NormalizedValue = Option<String>;

/// Result of normalizing a [`ValueSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedValues {
    /// Any value matches, provided the key is present.
    AnyValue,
    Values(BTreeSet<NormalizedValue>),
}

/// Normalize a value spec into the set of strings an atomic match accepts.
pub fn normalize(spec: &ValueSpec) -> Result<NormalizedValues> {
    match spec {
        ValueSpec::Object(map) if map.is_empty() => Ok(NormalizedValues::AnyValue),
        ValueSpec::List(items) => items
            .iter()
            .map(normalize_scalar)
            .collect::<Result<BTreeSet<_>>>()
            .map(NormalizedValues::Values),
        scalar => Ok(NormalizedValues::Values(BTreeSet::from([normalize_scalar(
            scalar,
        )?]))),
    }
}

fn normalize_scalar(spec: &ValueSpec) -> Result<NormalizedValue> {
    match spec {
        ValueSpec::Bool(b) => Ok(Some(bool_tag_value(*b).to_string())),
        ValueSpec::Int(i) => Ok(Some(i.to_string())),
        ValueSpec::Str(s) => Ok(Some(s.clone())),
        ValueSpec::Null => Ok(None),
        ValueSpec::List(_) => Err(FilterError::malformed_value("list is not allowed here", spec)),
        ValueSpec::Object(_) => Err(FilterError::malformed_value(
            "object is not allowed here",
            spec,
        )),
        ValueSpec::Unsupported(_) => Err(FilterError::malformed_value(
            "unexpected element, only bool, integer, string or null is allowed",
            spec,
        )),
    }
}

/// OSM convention for boolean tags.
pub fn bool_tag_value(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
