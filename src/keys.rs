//! Content Key Module
//!
//! Derives stable cache keys from a declared, rounded, name-sorted projection of
//! attributes. Equal logical inputs always produce the same key regardless of
//! the order the fields were supplied in.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Decimal places applied to numeric fields that declare no precision of their own.
pub const DEFAULT_DECIMALS: u32 = 2;

// == Field Value ==
/// An attribute value that can take part in a content key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Missing,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Missing)
    }
}

// == Content Key ==
/// Hex-encoded SHA-256 digest of a canonical field projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prepends a namespace, e.g. `commentary_<digest>`.
    pub fn namespaced(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.0)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Content Key Deriver ==
/// Declares which fields form a key and how numeric fields are rounded.
///
/// An empty projection hashes every supplied field, each number rounded to
/// [`DEFAULT_DECIMALS`].
#[derive(Debug, Clone, Default)]
pub struct ContentKeyDeriver {
    // name -> decimals for numeric values
    projection: BTreeMap<String, u32>,
}

impl ContentKeyDeriver {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` to the projection with the default numeric precision.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.rounded(name, DEFAULT_DECIMALS)
    }

    /// Adds `name` to the projection, rounding numeric values to `decimals` places.
    pub fn rounded(mut self, name: impl Into<String>, decimals: u32) -> Self {
        self.projection.insert(name.into(), decimals);
        self
    }

    // == Derive ==
    /// Computes the key for `fields`.
    ///
    /// Undeclared fields are ignored. Declared fields that were not supplied hash
    /// as null. When a name is supplied twice, the last value wins.
    pub fn derive<'a, I, V>(&self, fields: I) -> ContentKey
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<FieldValue>,
    {
        let supplied: BTreeMap<&str, FieldValue> = fields
            .into_iter()
            .map(|(name, value)| (name, value.into()))
            .collect();

        let canonical: BTreeMap<&str, Value> = if self.projection.is_empty() {
            supplied
                .iter()
                .map(|(name, value)| (*name, canonical_value(value, DEFAULT_DECIMALS)))
                .collect()
        } else {
            self.projection
                .iter()
                .map(|(name, decimals)| {
                    let value = supplied
                        .get(name.as_str())
                        .map(|value| canonical_value(value, *decimals))
                        .unwrap_or(Value::Null);
                    (name.as_str(), value)
                })
                .collect()
        };

        // BTreeMap serializes in key order, so the bytes are stable
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        ContentKey(hex::encode(Sha256::digest(&bytes)))
    }
}

// == Utility Functions ==
/// Rounds half away from zero to `decimals` places, normalizing negative zero.
///
/// Ties go away from zero (64.5 -> 65), not to even; keys only need to be stable
/// across calls of this function.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    rounded + 0.0
}

fn canonical_value(value: &FieldValue, decimals: u32) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Integer(n) => Value::from(*n),
        FieldValue::Number(n) if n.is_finite() => Value::from(round_to(*n, decimals)),
        FieldValue::Number(_) | FieldValue::Missing => Value::Null,
    }
}
