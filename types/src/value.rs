//! Canonical payload value: a closed tagged union over JSON-like data.
//!
//! Transaction payloads are arbitrary structured data, but they feed a hash
//! that other implementations must reproduce byte-for-byte. Modelling them as
//! a closed union (instead of an open dynamic type) keeps canonicalization
//! total: every variant has exactly one serialized form.
//!
//! Maps are `BTreeMap`s, so keys are always held in lexicographic order
//! regardless of insertion order.
//!
//! [`SharedValue`] is a reference-counted node with identity. Sharing the same
//! node in several places is allowed; a node that (transitively) contains
//! itself is a circular reference, which the canonical serializer and
//! [`Value::detach`] reject.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::TypesError;

pub use serde_json::Number;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Shared(SharedValue),
}

impl Value {
    /// The empty map `{}`, the payload of a transfer without one.
    pub fn empty_map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Build a map from key/value pairs. Insertion order is irrelevant.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Resolve every [`SharedValue`] into an owned copy, producing a plain
    /// tree that is safe to serialize anywhere.
    ///
    /// Fails with [`TypesError::CircularReference`] if a shared node recurs
    /// along its own descent path.
    pub fn detach(&self) -> Result<Value, TypesError> {
        let mut path = Vec::new();
        detach_inner(self, &mut path)
    }
}

fn detach_inner(value: &Value, path: &mut Vec<usize>) -> Result<Value, TypesError> {
    Ok(match value {
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|v| detach_inner(v, path))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), detach_inner(v, path)?)))
                .collect::<Result<_, TypesError>>()?,
        ),
        Value::Shared(node) => {
            let id = node.id();
            if path.contains(&id) {
                return Err(TypesError::CircularReference);
            }
            path.push(id);
            let detached = detach_inner(&node.read(), path);
            path.pop();
            detached?
        }
        scalar => scalar.clone(),
    })
}

/// A shared, mutable value node with reference identity.
///
/// Cloning a `SharedValue` yields another handle to the same node.
#[derive(Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Identity of the node (stable for its lifetime).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Read access to the node's current value.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the node's value.
    pub fn set(&self, value: Value) {
        let mut guard = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = value;
    }

    /// Mutate the node's value in place.
    pub fn update<F: FnOnce(&mut Value)>(&self, f: F) {
        let mut guard = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedValue {
    // Never recurses: a cyclic node would otherwise overflow the stack.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedValue(@{:#x})", self.id())
    }
}

// ── Conversions ─────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

/// Non-finite floats have no JSON form and become `Null`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<SharedValue> for Value {
    fn from(node: SharedValue) -> Self {
        Value::Shared(node)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ── Serde ───────────────────────────────────────────────────────────────

/// Plain JSON serialization. Shared nodes are written inline; callers that
/// may hold cyclic graphs must [`Value::detach`] first.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(entries) => entries.serialize(serializer),
            Value::Shared(node) => node.read().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
