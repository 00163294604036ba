//! Virtual node types.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::{ComponentDef, Instance};
use crate::reactive::Value;
use crate::renderer::NodeHandle;

/// Ordered node properties: attributes, `class`, `style`, `on*` handlers,
/// and for components, props and pass-through attributes.
pub type Props = IndexMap<String, Value>;

/// Marker tag for text nodes, used with [`h`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text;

/// Marker tag for fragments, used with [`h`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment;

/// The tag of a node. Two nodes are of the same type when their tags are
/// equal, or for components, when they share the same definition.
#[derive(Clone)]
pub enum VNodeType {
    Element(Rc<str>),
    Text,
    Fragment,
    Component(Rc<ComponentDef>),
}

impl VNodeType {
    pub fn same_type(&self, other: &VNodeType) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Text, VNodeType::Text) => true,
            (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            VNodeType::Element(_) => NodeKind::Element,
            VNodeType::Text => NodeKind::Text,
            VNodeType::Fragment => NodeKind::Fragment,
            VNodeType::Component(_) => NodeKind::Component,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "Element({tag})"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Fragment => f.write_str("Fragment"),
            VNodeType::Component(def) => write!(f, "Component({})", def.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<Text> for VNodeType {
    fn from(_: Text) -> Self {
        VNodeType::Text
    }
}

impl From<Fragment> for VNodeType {
    fn from(_: Fragment) -> Self {
        VNodeType::Fragment
    }
}

impl From<Rc<ComponentDef>> for VNodeType {
    fn from(def: Rc<ComponentDef>) -> Self {
        VNodeType::Component(def)
    }
}

impl From<&Rc<ComponentDef>> for VNodeType {
    fn from(def: &Rc<ComponentDef>) -> Self {
        VNodeType::Component(Rc::clone(def))
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Fragment,
    Component,
}

/// What a node's children are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenKind {
    None,
    Text,
    Nodes,
}

/// The two independent discriminants of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub node: NodeKind,
    pub children: ChildrenKind,
}

/// Diff key, unique among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl Key {
    /// Key from a prop value. Whole numbers become integer keys.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Str(s) => Some(Key::Str(Rc::from(s.as_str()))),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(Key::Int(*n as i64)),
            Value::Number(n) => Some(Key::Str(Rc::from(Value::Number(*n).to_display_string()))),
            _ => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Rc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Rc::from(s))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(i64::from(n))
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Children of a node.
#[derive(Debug, Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(String),
    Nodes(Vec<VNode>),
}

impl Children {
    pub fn kind(&self) -> ChildrenKind {
        match self {
            Children::None => ChildrenKind::None,
            Children::Text(_) => ChildrenKind::Text,
            Children::Nodes(_) => ChildrenKind::Nodes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> &[VNode] {
        match self {
            Children::Nodes(nodes) => nodes,
            _ => &[],
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

impl From<&str> for Children {
    fn from(s: &str) -> Self {
        Children::Text(s.to_string())
    }
}

impl From<String> for Children {
    fn from(s: String) -> Self {
        Children::Text(s)
    }
}

impl From<&String> for Children {
    fn from(s: &String) -> Self {
        Children::Text(s.clone())
    }
}

macro_rules! impl_children_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Children {
                fn from(n: $ty) -> Self {
                    Children::Text(Value::from(n).to_display_string())
                }
            }
        )*
    };
}

impl_children_from_number!(i32, i64, u32, u64, usize, f64);

impl From<Value> for Children {
    fn from(value: Value) -> Self {
        match value.unwrap_cell() {
            Value::Null => Children::None,
            other => Children::Text(other.to_display_string()),
        }
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl From<VNode> for Children {
    fn from(node: VNode) -> Self {
        Children::Nodes(vec![node])
    }
}

impl<T: Into<Children>> From<Option<T>> for Children {
    fn from(children: Option<T>) -> Self {
        children.map_or(Children::None, Into::into)
    }
}

/// A description of one node of the desired tree.
///
/// `el`, `anchor` and `component` are filled in when the node is mounted.
/// For a fragment, `el` is the start anchor and `anchor` the end anchor.
#[derive(Debug, Clone)]
pub struct VNode {
    pub ty: VNodeType,
    pub props: Props,
    pub children: Children,
    pub key: Option<Key>,
    pub el: Option<NodeHandle>,
    pub anchor: Option<NodeHandle>,
    pub component: Option<Instance>,
}

impl VNode {
    /// A text node.
    pub fn text(content: impl Into<String>) -> Self {
        h(Text, Props::new(), Children::Text(content.into()))
    }

    /// A fragment over `children`.
    pub fn fragment(children: Vec<VNode>) -> Self {
        h(Fragment, Props::new(), children)
    }

    /// Set the diff key.
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn shape(&self) -> Shape {
        Shape {
            node: self.ty.kind(),
            children: self.children.kind(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.ty.kind()
    }

    /// Tag of an element node.
    pub fn tag(&self) -> Option<&str> {
        match &self.ty {
            VNodeType::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Content of a text node.
    pub fn text_content(&self) -> &str {
        self.children.as_text().unwrap_or_default()
    }

    pub fn is_mounted(&self) -> bool {
        match &self.component {
            Some(instance) => instance.is_mounted(),
            None => self.el.is_some(),
        }
    }
}

/// Build a node.
///
/// The `key` prop becomes the node's diff key and is not kept in `props`.
/// Text children of a fragment are wrapped in a text node.
///
/// ```rust,ignore
/// let list = h("ul", props! {"class" => "todos"}, vec![
///     h("li", props! {"key" => 1}, "write"),
///     h("li", props! {"key" => 2}, "test"),
/// ]);
/// ```
pub fn h(ty: impl Into<VNodeType>, props: Props, children: impl Into<Children>) -> VNode {
    let ty = ty.into();
    let mut props = props;
    let key = props.shift_remove("key").and_then(|value| Key::from_value(&value));

    let children = match (&ty, children.into()) {
        (VNodeType::Fragment, Children::Text(text)) => Children::Nodes(vec![VNode::text(text)]),
        (_, children) => children,
    };

    VNode {
        ty,
        props,
        children,
        key,
        el: None,
        anchor: None,
        component: None,
    }
}

/// Result of a render step before normalization.
#[derive(Debug, Clone)]
pub enum Renderable {
    Node(VNode),
    List(Vec<VNode>),
    Text(String),
    Number(f64),
}

impl From<VNode> for Renderable {
    fn from(node: VNode) -> Self {
        Renderable::Node(node)
    }
}

impl From<Vec<VNode>> for Renderable {
    fn from(nodes: Vec<VNode>) -> Self {
        Renderable::List(nodes)
    }
}

impl From<&str> for Renderable {
    fn from(text: &str) -> Self {
        Renderable::Text(text.to_string())
    }
}

impl From<String> for Renderable {
    fn from(text: String) -> Self {
        Renderable::Text(text)
    }
}

impl From<f64> for Renderable {
    fn from(n: f64) -> Self {
        Renderable::Number(n)
    }
}

impl From<i32> for Renderable {
    fn from(n: i32) -> Self {
        Renderable::Number(f64::from(n))
    }
}

impl From<i64> for Renderable {
    fn from(n: i64) -> Self {
        Renderable::Number(n as f64)
    }
}

/// Turn a render result into a single node: lists become fragments, text and
/// numbers become text nodes.
pub fn normalize(rendered: Renderable) -> VNode {
    match rendered {
        Renderable::Node(node) => node,
        Renderable::List(nodes) => VNode::fragment(nodes),
        Renderable::Text(text) => VNode::text(text),
        Renderable::Number(n) => VNode::text(Value::Number(n).to_display_string()),
    }
}

/// Build ordered [`Props`] from `name => value` pairs.
///
/// ```rust,ignore
/// let props = props! {"id" => "main", "disabled" => true};
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::vnode::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::vnode::Props::new();
        $(
            props.insert(::std::string::String::from($key), $crate::reactive::Value::from($value));
        )+
        props
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    #[test]
    fn shape_is_derived_from_tag_and_children() {
        let element = h("div", props! {}, "hi");
        assert_eq!(
            element.shape(),
            Shape {
                node: NodeKind::Element,
                children: ChildrenKind::Text
            }
        );

        let list = h("ul", props! {}, vec![h("li", props! {}, ())]);
        assert_eq!(list.shape().children, ChildrenKind::Nodes);
        assert_eq!(list.children.as_nodes()[0].shape().children, ChildrenKind::None);

        assert_eq!(h(Text, props! {}, 42).text_content(), "42");
        assert_eq!(h(Fragment, props! {}, ()).kind(), NodeKind::Fragment);
    }

    #[test]
    fn key_prop_becomes_node_key() {
        let node = h("li", props! {"key" => "a", "class" => "item"}, ());
        assert_eq!(node.key, Some(Key::from("a")));
        assert!(!node.props.contains_key("key"));
        assert_eq!(node.props.len(), 1);

        let numbered = h("li", props! {"key" => 3}, ());
        assert_eq!(numbered.key, Some(Key::Int(3)));
    }

    #[test]
    fn normalize_wraps_lists_and_text() {
        let fragment = normalize(vec![VNode::text("a"), VNode::text("b")].into());
        assert_eq!(fragment.kind(), NodeKind::Fragment);
        assert_eq!(fragment.children.as_nodes().len(), 2);

        let text = normalize(Renderable::Number(7.0));
        assert_eq!(text.kind(), NodeKind::Text);
        assert_eq!(text.text_content(), "7");

        let node = normalize(h("p", props! {}, ()).into());
        assert_eq!(node.tag(), Some("p"));
    }

    #[test]
    fn fragment_text_children_become_text_node() {
        let fragment = h(Fragment, props! {}, "inline");
        let children = fragment.children.as_nodes();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text_content(), "inline");
    }

    #[test]
    fn same_type_compares_tags() {
        let div: VNodeType = "div".into();
        assert!(div.same_type(&VNodeType::from("div")));
        assert!(!div.same_type(&VNodeType::from("span")));
        assert!(!div.same_type(&VNodeType::Text));
        assert!(VNodeType::Fragment.same_type(&VNodeType::from(Fragment)));
    }
}
