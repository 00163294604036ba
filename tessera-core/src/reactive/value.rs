//! Dynamic values and change detection.
//!
//! [`Value`] is the loosely typed value that flows through props, attrs,
//! setup state and reactive objects. Typed signals use [`ReactiveValue`]
//! directly.

use std::fmt;
use std::rc::Rc;

use super::memo::Memo;
use super::object::{reactive, Object, Reactive};
use super::signal::Signal;

/// Values that can live inside a signal.
///
/// `has_changed` decides whether a write notifies subscribers. Two NaNs are
/// the same value; every other pair of distinct values is a change.
pub trait ReactiveValue: Clone + 'static {
    /// Whether replacing `self` with `new` is an observable change.
    fn has_changed(&self, new: &Self) -> bool;

    /// Convert a value into the form that is stored. Raw objects become
    /// reactive wrappers.
    fn into_stored(self) -> Self {
        self
    }
}

macro_rules! impl_reactive_value_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ReactiveValue for $ty {
                fn has_changed(&self, new: &Self) -> bool {
                    self != new
                }
            }
        )*
    };
}

impl_reactive_value_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String,
    &'static str,
);

impl ReactiveValue for f64 {
    fn has_changed(&self, new: &Self) -> bool {
        !(self == new || (self.is_nan() && new.is_nan()))
    }
}

impl ReactiveValue for f32 {
    fn has_changed(&self, new: &Self) -> bool {
        !(self == new || (self.is_nan() && new.is_nan()))
    }
}

impl<T: ReactiveValue> ReactiveValue for Option<T> {
    fn has_changed(&self, new: &Self) -> bool {
        match (self, new) {
            (Some(old), Some(new)) => old.has_changed(new),
            (None, None) => false,
            _ => true,
        }
    }

    fn into_stored(self) -> Self {
        self.map(ReactiveValue::into_stored)
    }
}

impl<T: ReactiveValue> ReactiveValue for Vec<T> {
    fn has_changed(&self, new: &Self) -> bool {
        self.len() != new.len() || self.iter().zip(new).any(|(a, b)| a.has_changed(b))
    }
}

/// An event handler stored in props. Compared by identity.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Value)>);

impl Handler {
    pub fn new(f: impl Fn(&Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Value) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    /// A raw (untracked) object.
    Object(Object),
    /// A tracked wrapper around an object.
    Reactive(Reactive),
    Signal(Signal<Value>),
    Memo(Memo<Value>),
    Handler(Handler),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Whether the value counts as "absent" for attribute patching.
    pub fn is_nullish_or_false(&self) -> bool {
        matches!(self, Value::Null | Value::Bool(false))
    }

    /// Read a field of an object value. Reactive objects track the read.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(object) => object.get_raw(key).unwrap_or_default(),
            Value::Reactive(reactive) => reactive.get(key),
            _ => Value::Null,
        }
    }

    /// Resolve signals and memos to their current value (tracked).
    pub fn unwrap_cell(&self) -> Value {
        match self {
            Value::Signal(signal) => signal.get(),
            Value::Memo(memo) => memo.get(),
            other => other.clone(),
        }
    }

    /// Entries of an object value, in insertion order. Reactive objects
    /// track every field read.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Value::Object(object) => object.entries(),
            Value::Reactive(reactive) => reactive
                .keys()
                .into_iter()
                .map(|key| {
                    let value = reactive.get(&key);
                    (key, value)
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// String form used for text content and attribute values.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) | Value::Reactive(_) => "[object Object]".to_string(),
            Value::Signal(signal) => signal.get_untracked().to_display_string(),
            Value::Memo(memo) => memo.get().to_display_string(),
            Value::Handler(_) => "[handler]".to_string(),
        }
    }

    /// Convert to JSON. Handlers become `null`; cells are read untracked.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null | Value::Handler(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Json::from(*n as i64),
            Value::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(object) => object.to_json(),
            Value::Reactive(reactive) => reactive.raw().to_json(),
            Value::Signal(signal) => signal.get_untracked().to_json(),
            Value::Memo(memo) => super::untracked(|| memo.get()).to_json(),
        }
    }
}

/// Format a number the way the host expects to see it in text.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl ReactiveValue for Value {
    fn has_changed(&self, new: &Self) -> bool {
        self != new
    }

    fn into_stored(self) -> Self {
        match self {
            Value::Object(object) => Value::Reactive(reactive(&object)),
            other => other,
        }
    }
}

/// Identity for objects, cells and handlers; structural otherwise.
/// Two NaNs compare equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => !a.has_changed(b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Signal(a), Value::Signal(b)) => a.ptr_eq(b),
            (Value::Memo(a), Value::Memo(b)) => a.ptr_eq(b),
            (Value::Handler(a), Value::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(object) => write!(f, "Object({})", object.id()),
            Value::Reactive(reactive) => write!(f, "Reactive({})", reactive.id()),
            Value::Signal(signal) => write!(f, "Signal({})", signal.id()),
            Value::Memo(memo) => write!(f, "Memo({})", memo.id()),
            Value::Handler(handler) => handler.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Reactive> for Value {
    fn from(reactive: Reactive) -> Self {
        Value::Reactive(reactive)
    }
}

impl From<Signal<Value>> for Value {
    fn from(signal: Signal<Value>) -> Self {
        Value::Signal(signal)
    }
}

impl From<Memo<Value>> for Value {
    fn from(memo: Memo<Value>) -> Self {
        Value::Memo(memo)
    }
}

impl From<Handler> for Value {
    fn from(handler: Handler) -> Self {
        Value::Handler(handler)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}
