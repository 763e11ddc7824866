//! Attribute values held by state objects.

use serde::{Deserialize, Serialize};

/// Possible values an object attribute can hold.
///
/// # Examples
///
/// ```
/// use qhist::Value;
///
/// assert_eq!(Value::from(3), Value::Int(3));
/// assert_eq!(Value::from("east"), Value::String("east".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer (positions, counters, ids).
    Int(i64),
    /// Floating point quantity.
    Float(f64),
    /// Free-form text.
    String(String),
}

impl Value {
    /// Feeds a canonical, type-tagged encoding of this value into `hasher`.
    ///
    /// Floats are hashed by bit pattern, so `0.0` and `-0.0` differ.
    pub fn hash_into(&self, hasher: &mut blake3::Hasher) {
        match self {
            Self::Bool(v) => {
                hasher.update(&[0u8, u8::from(*v)]);
            }
            Self::Int(v) => {
                hasher.update(&[1u8]);
                hasher.update(&v.to_le_bytes());
            }
            Self::Float(v) => {
                hasher.update(&[2u8]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            Self::String(v) => {
                hasher.update(&[3u8]);
                hasher.update(&(v.len() as u64).to_le_bytes());
                hasher.update(v.as_bytes());
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
