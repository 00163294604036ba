//! Property patching.
//!
//! | prop                                   | host effect                          |
//! |----------------------------------------|--------------------------------------|
//! | `class`                                | `class` attribute, empty when absent |
//! | `style`                                | per-property assign / clear          |
//! | `on[A-Z]...`                           | listener for the lower-cased rest    |
//! | `checked` `selected` `muted` `disabled`| boolean property, `""` means true    |
//! | anything else                          | attribute, removed on null / false   |

use super::host::{Host, NodeHandle};
use crate::reactive::Value;
use crate::vnode::Props;

const BOOLEAN_PROPS: [&str; 4] = ["checked", "selected", "muted", "disabled"];

/// Bring the host element from `old` props to `new` props.
pub(crate) fn patch_props(host: &dyn Host, el: NodeHandle, old: &Props, new: &Props) {
    for (key, value) in new {
        if key == "key" {
            continue;
        }
        let previous = old.get(key);
        if previous != Some(value) {
            patch_prop(host, el, key, previous, Some(value));
        }
    }

    for (key, value) in old {
        if key != "key" && !new.contains_key(key) {
            patch_prop(host, el, key, Some(value), None);
        }
    }
}

fn patch_prop(host: &dyn Host, el: NodeHandle, key: &str, old: Option<&Value>, new: Option<&Value>) {
    match key {
        "class" => {
            let class = new.map(Value::to_display_string).unwrap_or_default();
            host.set_attribute(el, "class", &class);
        }
        "style" => patch_style(host, el, old, new),
        _ if is_event(key) => {
            let event = key[2..].to_lowercase();
            if let Some(handler) = old.and_then(Value::as_handler) {
                host.remove_listener(el, &event, handler);
            }
            if let Some(handler) = new.and_then(Value::as_handler) {
                host.add_listener(el, &event, handler);
            }
        }
        _ if BOOLEAN_PROPS.contains(&key) => {
            host.set_property(el, key, new.is_some_and(truthy_prop));
        }
        _ => match new {
            Some(value) if !value.is_nullish_or_false() => {
                host.set_attribute(el, key, &value.to_display_string());
            }
            _ => host.remove_attribute(el, key),
        },
    }
}

fn is_event(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

fn truthy_prop(value: &Value) -> bool {
    match value {
        Value::Str(_) => true,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Null => false,
        _ => true,
    }
}

fn patch_style(host: &dyn Host, el: NodeHandle, old: Option<&Value>, new: Option<&Value>) {
    let old_entries = old.map(Value::entries).unwrap_or_default();
    let new_entries = match new {
        Some(Value::Str(text)) => {
            for (name, value) in &old_entries {
                if !value.is_null() {
                    host.clear_style(el, name);
                }
            }
            host.set_attribute(el, "style", text);
            return;
        }
        _ if matches!(old, Some(Value::Str(_))) => {
            // The string form owns the whole attribute
            host.remove_attribute(el, "style");
            new.map(Value::entries).unwrap_or_default()
        }
        Some(value) => value.entries(),
        None => Vec::new(),
    };

    for (name, value) in &new_entries {
        let unchanged = old_entries.iter().any(|(n, v)| n == name && v == value);
        if !unchanged {
            host.set_style(el, name, &value.to_display_string());
        }
    }
    for (name, value) in &old_entries {
        let kept = new_entries.iter().any(|(n, v)| n == name && !v.is_null());
        if !kept && !value.is_null() {
            host.clear_style(el, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::reactive::{Handler, Object};
    use crate::renderer::{HostOp, MemoryHost};

    fn setup() -> (MemoryHost, NodeHandle) {
        let host = MemoryHost::new();
        let el = host.create_element("div");
        host.clear_ops();
        (host, el)
    }

    fn style(entries: &[(&str, &str)]) -> Value {
        Value::Object(entries.iter().map(|(k, v)| (*k, Value::from(*v))).collect::<Object>())
    }

    #[test]
    fn attributes_set_and_removed() {
        let (host, el) = setup();
        patch_props(&host, el, &props! {}, &props! {"id" => "a", "title" => "t"});
        assert_eq!(host.attribute(el, "id").as_deref(), Some("a"));

        patch_props(
            &host,
            el,
            &props! {"id" => "a", "title" => "t"},
            &props! {"id" => false},
        );
        assert_eq!(host.attribute(el, "id"), None);
        assert_eq!(host.attribute(el, "title"), None);
    }

    #[test]
    fn unchanged_props_emit_nothing() {
        let (host, el) = setup();
        let handler = Handler::new(|_| {});
        let props = props! {"class" => "x", "onClick" => handler, "n" => f64::NAN};
        patch_props(&host, el, &props, &props.clone());
        assert_eq!(host.op_count(), 0);
    }

    #[test]
    fn class_clears_to_empty() {
        let (host, el) = setup();
        patch_props(&host, el, &props! {"class" => "on"}, &props! {});
        assert_eq!(host.attribute(el, "class").as_deref(), Some(""));
    }

    #[test]
    fn boolean_props_treat_empty_string_as_true() {
        let (host, el) = setup();
        patch_props(&host, el, &props! {}, &props! {"disabled" => "", "checked" => false});
        assert_eq!(host.property(el, "disabled"), Some(true));
        assert_eq!(host.property(el, "checked"), Some(false));
    }

    #[test]
    fn listeners_are_swapped() {
        let (host, el) = setup();
        let first = Handler::new(|_| {});
        let second = Handler::new(|_| {});
        patch_props(&host, el, &props! {}, &props! {"onClick" => first.clone()});
        patch_props(
            &host,
            el,
            &props! {"onClick" => first},
            &props! {"onClick" => second},
        );
        assert_eq!(host.listener_count(el, "click"), 1);

        let ops = host.ops();
        assert!(matches!(ops[1], HostOp::RemoveListener { .. }));
        assert!(matches!(ops[2], HostOp::AddListener { .. }));
    }

    #[test]
    fn lowercase_on_prefix_is_an_attribute() {
        let (host, el) = setup();
        patch_props(&host, el, &props! {}, &props! {"once" => "yes"});
        assert_eq!(host.attribute(el, "once").as_deref(), Some("yes"));
    }

    #[test]
    fn style_entries_are_diffed() {
        let (host, el) = setup();
        let old = style(&[("color", "red"), ("margin", "0")]);
        patch_props(&host, el, &props! {}, &props! {"style" => old.clone()});
        host.clear_ops();

        let new = style(&[("color", "red"), ("padding", "1px")]);
        patch_props(&host, el, &props! {"style" => old}, &props! {"style" => new});

        assert_eq!(host.style(el, "color").as_deref(), Some("red"));
        assert_eq!(host.style(el, "padding").as_deref(), Some("1px"));
        assert_eq!(host.style(el, "margin"), None);
        assert_eq!(host.op_count(), 2);
    }

    #[test]
    fn style_string_replaced_by_entries() {
        let (host, el) = setup();
        let text = props! {"style" => "color: red"};
        patch_props(&host, el, &props! {}, &text);
        assert_eq!(host.attribute(el, "style").as_deref(), Some("color: red"));

        let entries = props! {"style" => style(&[("color", "blue")])};
        patch_props(&host, el, &text, &entries);
        assert_eq!(host.attribute(el, "style"), None);
        assert_eq!(host.style(el, "color").as_deref(), Some("blue"));

        patch_props(&host, el, &entries, &text);
        assert_eq!(host.style(el, "color"), None);
        assert_eq!(host.attribute(el, "style").as_deref(), Some("color: red"));

        patch_props(&host, el, &text, &props! {});
        assert_eq!(host.attribute(el, "style"), None);
    }
}
