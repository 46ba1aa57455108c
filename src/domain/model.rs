use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single property value. Strings may carry placeholders, the typed variants
/// are opaque and pass through resolution untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, PropertyValue::String(_))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            // `1.0` must not collapse to `1` when spliced into text.
            PropertyValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

/// Flat key to value mapping. Ordered so output and error reporting are deterministic.
pub type PropertyMapping = BTreeMap<String, PropertyValue>;

/// Builds a mapping from string pairs, handy for defaults and tests.
pub fn mapping_from<K, V, I>(pairs: I) -> PropertyMapping
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropertyValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A mapping plus the name of the source it came from. Rank is its position in
/// the layer list, the name is only used for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLayer {
    pub name: String,
    pub properties: PropertyMapping,
}

impl SourceLayer {
    pub fn new(name: impl Into<String>, properties: PropertyMapping) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}
