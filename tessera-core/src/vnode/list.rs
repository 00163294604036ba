//! List rendering helper.

use super::node::VNode;
use crate::reactive::Value;

/// Map a source value to child nodes.
///
/// The callback receives `(item, index)`:
///
/// - a list yields each item with its position,
/// - a string yields each character with its position,
/// - an object yields each field value with its name,
/// - a number `n` yields `1..=n` with positions `0..n`.
///
/// Signals and memos are read (tracked) first. Anything else yields nothing.
pub fn render_list<F>(source: &Value, mut render: F) -> Vec<VNode>
where
    F: FnMut(Value, Value) -> VNode,
{
    match source.unwrap_cell() {
        Value::List(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| render(item, Value::from(i)))
            .collect(),
        Value::Str(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| render(Value::Str(c.to_string()), Value::from(i)))
            .collect(),
        object @ (Value::Object(_) | Value::Reactive(_)) => object
            .entries()
            .into_iter()
            .map(|(key, value)| render(value, Value::Str(key)))
            .collect(),
        Value::Number(n) if n.is_finite() && n >= 0.0 => (0..n as usize)
            .map(|i| render(Value::from(i + 1), Value::from(i)))
            .collect(),
        _ => Vec::new(),
    }
}
