//! Typed property store
//!
//! A heterogeneous map used by steps to hand intermediate data to each other
//! (resolved addresses, response status, headers, raw bodies). Every entry is
//! either a persistent [`Value`] that survives serialization, or a transient
//! value (a live client, an in-memory document) that only exists for the run.

use std::any::{type_name, Any};
use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by property lookups and key construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("Property key must not be empty")]
    EmptyKey,

    #[error("Property not found: {key}")]
    NotFound { key: PropertyKey },

    #[error("Property type mismatch for {key}: expected {expected}, found {actual}")]
    TypeMismatch {
        key: PropertyKey,
        expected: &'static str,
        actual: &'static str,
    },
}

// ============================================================================
// Keys
// ============================================================================

/// Case-sensitive, non-empty property identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyKey(Cow<'static, str>);

impl PropertyKey {
    /// Create a key from a runtime string
    pub fn new(id: impl Into<String>) -> Result<Self, PropertyError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PropertyError::EmptyKey);
        }
        Ok(Self(Cow::Owned(id)))
    }

    /// Create a key at compile time. Panics (at compile time when used in a
    /// `const`) if `id` is empty.
    pub const fn from_static(id: &'static str) -> Self {
        assert!(!id.is_empty(), "property key must not be empty");
        Self(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PropertyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PropertyKey {
    type Error = PropertyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PropertyKey {
    type Error = PropertyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PropertyKey> for String {
    fn from(key: PropertyKey) -> Self {
        key.0.into_owned()
    }
}

// ============================================================================
// Values
// ============================================================================

/// Plain data that can be persisted with a run record.
///
/// Integers of any width are stored as `i64`, so they are read back with
/// `get::<i64>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// Short tag naming the variant, used by the XML codec
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Rust type name of the payload
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => type_name::<bool>(),
            Value::Int(_) => type_name::<i64>(),
            Value::Float(_) => type_name::<f64>(),
            Value::Text(_) => type_name::<String>(),
            Value::Bytes(_) => type_name::<Vec<u8>>(),
            Value::Timestamp(_) => type_name::<DateTime<Utc>>(),
            Value::Duration(_) => type_name::<Duration>(),
            Value::List(_) => type_name::<Vec<String>>(),
            Value::Map(_) => type_name::<BTreeMap<String, String>>(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        match self {
            Value::Bool(v) => v as &dyn Any,
            Value::Int(v) => v as &dyn Any,
            Value::Float(v) => v as &dyn Any,
            Value::Text(v) => v as &dyn Any,
            Value::Bytes(v) => v as &dyn Any,
            Value::Timestamp(v) => v as &dyn Any,
            Value::Duration(v) => v as &dyn Any,
            Value::List(v) => v as &dyn Any,
            Value::Map(v) => v as &dyn Any,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    u16 => Int,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Timestamp,
    Duration => Duration,
    Vec<String> => List,
    BTreeMap<String, String> => Map,
}

#[derive(Clone)]
enum Entry {
    Persistent(Value),
    Transient {
        type_name: &'static str,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl Entry {
    fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            Entry::Persistent(v) => v.as_any().downcast_ref::<T>(),
            Entry::Transient { value, .. } => {
                let any: &(dyn Any + Send + Sync) = &**value;
                any.downcast_ref::<T>()
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Entry::Persistent(v) => v.type_name(),
            Entry::Transient { type_name, .. } => type_name,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Persistent(v) => v.fmt(f),
            Entry::Transient { type_name, .. } => write!(f, "<transient {}>", type_name),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Heterogeneous, type-checked key/value store
#[derive(Clone, Default)]
pub struct PropertyStore {
    entries: BTreeMap<PropertyKey, Entry>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a persistent value
    pub fn set(&mut self, key: PropertyKey, value: impl Into<Value>) {
        self.entries.insert(key, Entry::Persistent(value.into()));
    }

    /// Insert or replace a transient value. Transient values are never
    /// serialized.
    pub fn set_transient<T: Any + Send + Sync>(&mut self, key: PropertyKey, value: T) {
        self.entries.insert(
            key,
            Entry::Transient {
                type_name: type_name::<T>(),
                value: Arc::new(value),
            },
        );
    }

    /// Typed lookup that fails with `NotFound` or `TypeMismatch`
    pub fn get<T: Any>(&self, key: &PropertyKey) -> Result<&T, PropertyError> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| PropertyError::NotFound { key: key.clone() })?;

        entry.downcast::<T>().ok_or_else(|| PropertyError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
            actual: entry.type_name(),
        })
    }

    /// Typed lookup returning `None` both for a missing key and a value of
    /// another type
    pub fn try_get<T: Any>(&self, key: &PropertyKey) -> Option<&T> {
        self.entries.get(key).and_then(Entry::downcast::<T>)
    }

    /// Raw persistent value, `None` for missing or transient entries
    pub fn value(&self, key: &PropertyKey) -> Option<&Value> {
        match self.entries.get(key)? {
            Entry::Persistent(v) => Some(v),
            Entry::Transient { .. } => None,
        }
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_transient(&self, key: &PropertyKey) -> bool {
        matches!(self.entries.get(key), Some(Entry::Transient { .. }))
    }

    pub fn remove(&mut self, key: &PropertyKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.keys()
    }

    /// Persistent entries in key order; this is what codecs write
    pub fn persistent(&self) -> impl Iterator<Item = (&PropertyKey, &Value)> {
        self.entries.iter().filter_map(|(k, e)| match e {
            Entry::Persistent(v) => Some((k, v)),
            Entry::Transient { .. } => None,
        })
    }

    /// Copy every entry of `other` into this store, overwriting on conflict
    pub fn extend(&mut self, other: PropertyStore) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl FromIterator<(PropertyKey, Value)> for PropertyStore {
    fn from_iter<I: IntoIterator<Item = (PropertyKey, Value)>>(iter: I) -> Self {
        let mut store = PropertyStore::new();
        for (key, value) in iter {
            store.set(key, value);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: PropertyKey = PropertyKey::from_static("http.status");

    #[test]
    fn test_empty_key_rejected() {
        assert_eq!(PropertyKey::new(""), Err(PropertyError::EmptyKey));
        assert!(PropertyKey::new("a").is_ok());
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let lower = PropertyKey::new("http.status").unwrap();
        let upper = PropertyKey::new("HTTP.status").unwrap();
        assert_eq!(lower, STATUS);
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = PropertyStore::new();
        store.set(STATUS, 200u16);
        store.set(STATUS, 404u16);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get::<i64>(&STATUS), Ok(&404));
    }

    #[test]
    fn test_try_get_missing_key() {
        let store = PropertyStore::new();
        assert!(store.try_get::<i64>(&STATUS).is_none());
    }

    #[test]
    fn test_try_get_wrong_type_does_not_fail() {
        let mut store = PropertyStore::new();
        store.set(STATUS, "ok");
        assert!(store.try_get::<i64>(&STATUS).is_none());
        assert_eq!(store.try_get::<String>(&STATUS).map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_get_missing_key_is_not_found() {
        let store = PropertyStore::new();
        let err = store.get::<i64>(&STATUS).unwrap_err();
        assert_eq!(err, PropertyError::NotFound { key: STATUS });
    }

    #[test]
    fn test_get_wrong_type_is_type_mismatch() {
        let mut store = PropertyStore::new();
        store.set(STATUS, "ok");

        match store.get::<i64>(&STATUS) {
            Err(PropertyError::TypeMismatch { key, expected, actual }) => {
                assert_eq!(key, STATUS);
                assert_eq!(expected, "i64");
                assert_eq!(actual, type_name::<String>());
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_transient_values() {
        struct Connection {
            port: u16,
        }

        let key = PropertyKey::from_static("http.client");
        let mut store = PropertyStore::new();
        store.set_transient(key.clone(), Connection { port: 443 });
        store.set(STATUS, 200u16);

        assert!(store.is_transient(&key));
        assert_eq!(store.get::<Connection>(&key).unwrap().port, 443);
        assert!(store.value(&key).is_none());

        let persisted: Vec<_> = store.persistent().map(|(k, _)| k.clone()).collect();
        assert_eq!(persisted, vec![STATUS]);
    }

    #[test]
    fn test_extend_overwrites() {
        let mut a = PropertyStore::new();
        a.set(STATUS, 200u16);
        let mut b = PropertyStore::new();
        b.set(STATUS, 500u16);
        b.set(PropertyKey::from_static("dns.addresses"), vec!["10.0.0.1".to_string()]);

        a.extend(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get::<i64>(&STATUS), Ok(&500));
    }
}
