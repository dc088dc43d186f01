//! Action input maps and the provided/omitted parameter wrapper.
//!
//! The backend validates inputs itself; this side only guarantees that an
//! optional key reaches the wire exactly when the caller supplied it.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// An optional tool parameter.
///
/// `Omitted` covers both a missing field and an explicit JSON `null`.
/// Anything else, including `""`, `0` and `false`, is `Provided`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param<T> {
    Provided(T),
    Omitted,
}

impl<T> Default for Param<T> {
    fn default() -> Self {
        Self::Omitted
    }
}

impl<T> Param<T> {
    /// The provided value, or `default` when omitted.
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Provided(v) => v,
            Self::Omitted => default,
        }
    }
}

impl<T> From<Option<T>> for Param<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Omitted, Self::Provided)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Param<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

/// The `input` object of one remote action request. Keys are unique; a
/// later insert of the same key replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInput(Map<String, Value>);

impl ActionInput {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Always include `key`.
    #[must_use]
    pub fn required(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Include `key` only when the parameter was provided.
    #[must_use]
    pub fn optional<T>(mut self, key: &str, param: &Param<T>) -> Self
    where
        T: Clone + Into<Value>,
    {
        if let Param::Provided(value) = param {
            self.0.insert(key.to_string(), value.clone().into());
        }
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sorted key set.
    #[cfg(test)]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
