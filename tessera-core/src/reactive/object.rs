//! Reactive objects.
//!
//! An [`Object`] is a raw, shared field table. [`reactive`] wraps it in a
//! [`Reactive`] whose accessors call `track` on read and `trigger` on write.
//!
//! # Identity
//!
//! A thread-local table maps each object's id to its wrapper (held weakly),
//! so wrapping the same object twice yields the same wrapper for as long as
//! any handle to it is alive. Nested objects are wrapped on first read, not
//! when the outer object is wrapped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::runtime::Runtime;
use super::subscriber::TargetId;
use super::value::{ReactiveValue, Value};

/// Key tracked by operations that depend on the set of fields.
const KEYS: &str = "\u{0}keys";

thread_local! {
    static WRAPPERS: RefCell<HashMap<TargetId, Weak<ReactiveInner>>> = RefCell::new(HashMap::new());
}

struct ObjectInner {
    id: TargetId,
    fields: RefCell<IndexMap<String, Value>>,
}

/// A raw object: ordered fields behind shared ownership, compared by identity.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Object {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: TargetId::new(),
                fields: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Stable identity of the object.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Read a field without tracking.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.inner.fields.borrow().get(key).cloned()
    }

    /// Write a field without triggering. Returns the previous value.
    pub fn insert_raw(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.fields.borrow_mut().insert(key.into(), value)
    }

    pub fn remove_raw(&self, key: &str) -> Option<Value> {
        self.inner.fields.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .fields
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.inner
                .fields
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut fields = object.inner.fields.borrow_mut();
            for (key, value) in iter {
                fields.insert(key.into(), value);
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id())
            .field("fields", &*self.inner.fields.borrow())
            .finish()
    }
}

struct ReactiveInner {
    raw: Object,
}

impl Drop for ReactiveInner {
    fn drop(&mut self) {
        let id = self.raw.id();
        // The table may already be gone during thread teardown.
        let _ = WRAPPERS.try_with(|wrappers| {
            if let Ok(mut wrappers) = wrappers.try_borrow_mut() {
                wrappers.remove(&id);
            }
        });
    }
}

/// A tracked view of an [`Object`].
#[derive(Clone)]
pub struct Reactive {
    inner: Rc<ReactiveInner>,
}

/// Wrap `target` for tracking, reusing the live wrapper if one exists.
pub fn reactive(target: &Object) -> Reactive {
    let id = target.id();
    if let Some(existing) = WRAPPERS.with(|w| w.borrow().get(&id).and_then(Weak::upgrade)) {
        return Reactive { inner: existing };
    }

    let inner = Rc::new(ReactiveInner { raw: target.clone() });
    WRAPPERS.with(|w| w.borrow_mut().insert(id, Rc::downgrade(&inner)));
    Reactive { inner }
}

/// Wrap a value if it is a raw object; other values pass through.
pub fn to_reactive(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Reactive(reactive(&object)),
        other => other,
    }
}

/// Strip a reactive wrapper down to its raw object.
pub fn to_raw(value: Value) -> Value {
    match value {
        Value::Reactive(wrapper) => Value::Object(wrapper.raw().clone()),
        other => other,
    }
}

impl Reactive {
    /// Create a reactive object from field/value pairs.
    pub fn from_fields<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        reactive(&fields.into_iter().collect())
    }

    /// Identity of the underlying object; also the tracking target.
    pub fn id(&self) -> TargetId {
        self.inner.raw.id()
    }

    /// The underlying raw object.
    pub fn raw(&self) -> &Object {
        &self.inner.raw
    }

    /// Read a field, tracking it. Object-valued fields are returned wrapped.
    pub fn get(&self, key: &str) -> Value {
        Runtime::track(self.id(), key);
        to_reactive(self.inner.raw.get_raw(key).unwrap_or_default())
    }

    /// Check whether a field exists, tracking it.
    pub fn has(&self, key: &str) -> bool {
        Runtime::track(self.id(), key);
        self.inner.raw.contains_key(key)
    }

    /// Field names, tracking additions and removals.
    pub fn keys(&self) -> Vec<String> {
        Runtime::track(self.id(), KEYS);
        self.inner.raw.keys()
    }

    /// Write a field. Subscribers are notified only if the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = to_raw(value.into());
        let previous = self.inner.raw.insert_raw(key, value.clone());

        match previous {
            Some(old) if !old.has_changed(&value) => {}
            Some(_) => Runtime::trigger(self.id(), key),
            None => {
                Runtime::trigger(self.id(), key);
                Runtime::trigger(self.id(), KEYS);
            }
        }
    }

    /// Remove a field, notifying subscribers if it existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.raw.remove_raw(key)?;
        Runtime::trigger(self.id(), key);
        Runtime::trigger(self.id(), KEYS);
        Some(removed)
    }

    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.inner.raw).finish()
    }
}
