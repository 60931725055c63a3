//! Ordered request parameters keyed by position or name.
//!
//! A [`Params`] set mirrors the parameter bag a front controller extracts from
//! a request: values are kept in insertion order and addressed either by a
//! numeric index or by a name. A set whose keys are all indices is
//! positional; a single named key makes it named, which switches the binder
//! to name-based matching.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Key addressing a single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Positional parameter.
    Index(usize),
    /// Named parameter.
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Ordered mapping from [`ParamKey`] to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Value)>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a positional parameter set from the given values.
    #[must_use]
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(index, value)| (ParamKey::Index(index), value.into()))
                .collect(),
        }
    }

    /// Builds a named parameter set from `(name, value)` pairs.
    #[must_use]
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.set(ParamKey::Name(name.into()), value);
        }
        params
    }

    /// Sets a parameter, replacing an existing entry in place.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) {
        let param_key = key.into();
        let param_value = value.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == param_key)
        {
            entry.1 = param_value;
            return;
        }
        self.entries.push((param_key, param_value));
    }

    /// Appends a value at the next free positional index.
    pub fn push(&mut self, value: impl Into<Value>) {
        let next = self
            .entries
            .iter()
            .filter_map(|(key, _)| match key {
                ParamKey::Index(index) => Some(index.saturating_add(1)),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.entries.push((ParamKey::Index(next), value.into()));
    }

    /// Looks up a parameter by key.
    #[must_use]
    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Looks up a named parameter.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(key, value)| match key {
            ParamKey::Name(existing) if existing == name => Some(value),
            _ => None,
        })
    }

    /// Looks up a positional parameter.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(&ParamKey::Index(index))
    }

    /// Returns `true` when at least one key is a name.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.entries
            .iter()
            .any(|(key, _)| matches!(key, ParamKey::Name(_)))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Iterates over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Renders the set as a JSON array (positional) or object (named).
    #[must_use]
    pub fn to_value(&self) -> Value {
        if self.is_named() {
            let map: Map<String, Value> = self
                .entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect();
            Value::Object(map)
        } else {
            Value::Array(self.values().cloned().collect())
        }
    }
}

impl FromIterator<Value> for Params {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::positional(iter)
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

impl TryFrom<Value> for Params {
    type Error = DispatchError;

    /// Accepts JSON arrays as positional and objects as named parameters.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(values) => Ok(Self::positional(values)),
            Value::Object(map) => Ok(Self::named(map)),
            _ => Err(DispatchError::InvalidParams),
        }
    }
}
