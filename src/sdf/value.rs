//! Field values of the layer document model.
//!
//! Only three value shapes can carry asset paths: a single [`AssetPath`], an
//! array of them, and a dictionary (which may nest either). [`Value::kind`]
//! classifies a value into one of those shapes once, so the traversal never
//! inspects value types anywhere else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An authored asset path: the literal string naming an external file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    /// Creates an asset path from its authored string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the authored string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty asset path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@", self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A dictionary value, ordered by key.
pub type Dictionary = BTreeMap<String, Value>;

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Double precision float
    Double(f64),
    /// Plain string. Never treated as an asset path, except for clip templates.
    String(String),
    /// Token
    Token(String),
    /// Single asset path
    Asset(AssetPath),
    /// Array of asset paths
    AssetArray(Vec<AssetPath>),
    /// Array of strings
    StringArray(Vec<String>),
    /// Nested dictionary
    Dictionary(Dictionary),
}

/// The shapes of value that can hold asset paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single [`AssetPath`]
    Scalar,
    /// An array of [`AssetPath`]s
    Array,
    /// A dictionary, walked key by key
    Dict,
}

impl Value {
    /// Classifies the value; `None` for values that can never hold asset paths.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Asset(_) => Some(ValueKind::Scalar),
            Self::AssetArray(_) => Some(ValueKind::Array),
            Self::Dictionary(_) => Some(ValueKind::Dict),
            _ => None,
        }
    }

    /// Convenience constructor for an asset-path value.
    pub fn asset(path: impl Into<String>) -> Self {
        Self::Asset(AssetPath::new(path))
    }

    /// Convenience constructor for an asset-path array value.
    pub fn asset_array<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AssetArray(paths.into_iter().map(AssetPath::new).collect())
    }

    /// Returns the string payload of `String` and `Token` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a numeric payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the dictionary payload.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a nested value by dictionary key path. An empty key path
    /// returns the value itself.
    pub fn get_at_key_path(&self, key_path: &[String]) -> Option<&Value> {
        let Some((first, rest)) = key_path.split_first() else {
            return Some(self);
        };
        self.as_dictionary()?.get(first)?.get_at_key_path(rest)
    }

    /// Replaces the nested value at `key_path`; `None` removes the entry.
    ///
    /// Returns `false` if an intermediate key is missing or not a dictionary.
    /// An empty key path replaces the whole value (removal is not possible
    /// there and returns `false`).
    pub fn set_at_key_path(&mut self, key_path: &[String], value: Option<Value>) -> bool {
        let Some((first, rest)) = key_path.split_first() else {
            return match value {
                Some(v) => {
                    *self = v;
                    true
                }
                None => false,
            };
        };

        let Self::Dictionary(dict) = self else {
            return false;
        };

        if rest.is_empty() {
            match value {
                Some(v) => {
                    dict.insert(first.clone(), v);
                }
                None => {
                    dict.remove(first);
                }
            }
            return true;
        }

        match dict.get_mut(first) {
            Some(child) => child.set_at_key_path(rest, value),
            None => false,
        }
    }
}

impl From<AssetPath> for Value {
    fn from(value: AssetPath) -> Self {
        Self::Asset(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Self::Dictionary(value)
    }
}
