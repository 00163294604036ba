//! Integration Tests for the Reconciler
//!
//! These tests render trees into a `MemoryHost` and check both the resulting
//! host tree and the mutations it took to get there.

use std::collections::HashSet;
use std::rc::Rc;

use proptest::prelude::*;
use tessera_core::{h, props, HostOp, MemoryHost, NodeHandle, OpLog, Renderer, VNode};

struct Harness {
    host: Rc<MemoryHost>,
    renderer: Renderer,
    root: NodeHandle,
}

impl Harness {
    fn new() -> Self {
        let host = Rc::new(MemoryHost::new());
        let renderer = Renderer::new(host.clone());
        let root = host.create_root();
        Self { host, renderer, root }
    }

    fn render(&self, vnode: VNode) {
        self.renderer.render(Some(vnode), self.root).unwrap();
    }

    /// Render `vnode` and return only the mutations it caused.
    fn rerender(&self, vnode: VNode) -> Vec<HostOp> {
        self.host.clear_ops();
        self.render(vnode);
        self.host.ops()
    }

    fn list_el(&self) -> NodeHandle {
        self.host.children(self.root)[0]
    }

    fn item_nodes(&self) -> Vec<NodeHandle> {
        self.host.children(self.list_el())
    }

    fn item_texts(&self) -> Vec<String> {
        self.item_nodes().iter().map(|n| self.host.text(*n)).collect()
    }
}

fn keyed_list<S: AsRef<str>>(keys: &[S]) -> VNode {
    h(
        "ul",
        props! {},
        keys.iter()
            .map(|k| h("li", props! {"key" => k.as_ref()}, k.as_ref()))
            .collect::<Vec<_>>(),
    )
}

fn count(ops: &[HostOp], pred: fn(&HostOp) -> bool) -> usize {
    ops.iter().filter(|op| pred(op)).count()
}

/// Test that swapping two middle items costs exactly one move.
#[test]
fn keyed_swap_is_a_single_move() {
    let harness = Harness::new();
    harness.render(keyed_list(&["a", "b", "c", "d"]));
    let before = harness.item_nodes();
    let (b, c) = (before[1], before[2]);

    let ops = harness.rerender(keyed_list(&["a", "c", "b", "d"]));

    assert_eq!(harness.item_texts(), ["a", "c", "b", "d"]);
    assert_eq!(count(&ops, HostOp::is_move), 1);
    assert_eq!(count(&ops, HostOp::is_insert), 0);
    assert_eq!(count(&ops, HostOp::is_remove), 0);

    // The longest stable run keeps `b`, so `c` moves in front of it
    let moved: Vec<_> = ops.iter().filter(|op| op.is_move()).collect();
    assert!(
        matches!(moved[0], HostOp::Move { node, anchor: Some(anchor), .. } if *node == c && *anchor == b),
        "unexpected move: {:?}",
        moved[0]
    );

    // Every host node survives, just reordered
    let after: HashSet<_> = harness.item_nodes().into_iter().collect();
    assert_eq!(after, before.into_iter().collect());
}

/// Test that inserting in the middle creates one node before its successor.
#[test]
fn keyed_insert_lands_before_successor() {
    let harness = Harness::new();
    harness.render(keyed_list(&["a", "b", "c"]));
    let b = harness.item_nodes()[1];

    let ops = harness.rerender(keyed_list(&["a", "x", "b", "c"]));

    assert_eq!(harness.item_texts(), ["a", "x", "b", "c"]);
    assert_eq!(count(&ops, HostOp::is_move), 0);
    assert_eq!(count(&ops, HostOp::is_remove), 0);

    let inserts: Vec<_> = ops.iter().filter(|op| op.is_insert()).collect();
    assert_eq!(inserts.len(), 1);
    assert!(matches!(inserts[0], HostOp::Insert { anchor: Some(anchor), .. } if *anchor == b));
}

/// Test that re-rendering an identical tree touches nothing.
#[test]
fn identical_render_is_a_no_op() {
    let harness = Harness::new();
    let tree = || {
        h(
            "div",
            props! {"class" => "box", "id" => "main"},
            vec![keyed_list(&["a", "b"]), h("p", props! {}, "hello"), VNode::text("tail")],
        )
    };
    harness.render(tree());

    let ops = harness.rerender(tree());
    assert!(ops.is_empty(), "unexpected ops: {ops:?}");
}

/// Test that a keyed list with no reordering needs no moves.
#[test]
fn keyed_removal_and_append_without_moves() {
    let harness = Harness::new();
    harness.render(keyed_list(&["a", "b", "c", "d"]));

    let ops = harness.rerender(keyed_list(&["a", "c", "d", "e"]));

    assert_eq!(harness.item_texts(), ["a", "c", "d", "e"]);
    assert_eq!(count(&ops, HostOp::is_move), 0);
    assert_eq!(count(&ops, HostOp::is_remove), 1);
    assert_eq!(count(&ops, HostOp::is_insert), 1);
}

/// Test that emptying a list and refilling it works.
#[test]
fn keyed_list_to_empty_and_back() {
    let harness = Harness::new();
    harness.render(keyed_list(&["a", "b"]));

    let ops = harness.rerender(keyed_list::<&str>(&[]));
    assert!(harness.item_nodes().is_empty());
    assert_eq!(count(&ops, HostOp::is_remove), 2);

    harness.render(keyed_list(&["c", "a"]));
    assert_eq!(harness.item_texts(), ["c", "a"]);
}

/// Test that switching element type replaces the node in place.
#[test]
fn type_change_keeps_sibling_position() {
    let harness = Harness::new();
    let tree = |middle: VNode| h("div", props! {}, vec![VNode::text("a"), middle, VNode::text("c")]);

    harness.render(tree(h("span", props! {}, "b")));
    harness.render(tree(h("em", props! {}, "b")));

    assert_eq!(harness.host.inner_html(harness.root), "<div>a<em>b</em>c</div>");
}

/// Test that a recorded op log survives a MessagePack round trip and
/// replays the same mutations.
#[test]
fn op_log_is_portable() {
    let harness = Harness::new();
    harness.render(keyed_list(&["a", "b", "c"]));
    harness.host.clear_ops();
    harness.render(keyed_list(&["c", "a", "b"]));

    let log = harness.host.take_ops();
    let bytes = log.to_msgpack().unwrap();
    let decoded = OpLog::from_msgpack(&bytes).unwrap();

    assert_eq!(decoded, log);
    assert_eq!(decoded.iter().filter(|op| op.is_move()).count(), 1);
}

fn unique_keys() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::hash_set(0u8..24, 0..12)
        .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    /// Any keyed reorder ends in the new order, reuses surviving nodes and
    /// only creates or removes what it must.
    #[test]
    fn keyed_diff_matches_target_order(before in unique_keys(), after in unique_keys()) {
        let names = |keys: &[u8]| keys.iter().map(|k| format!("k{k}")).collect::<Vec<_>>();
        let (before_names, after_names) = (names(&before), names(&after));

        let harness = Harness::new();
        harness.render(keyed_list(&before_names));
        let survivors: HashSet<_> = harness
            .item_nodes()
            .into_iter()
            .zip(&before)
            .filter(|(_, key)| after.contains(*key))
            .map(|(node, _)| node)
            .collect();

        let ops = harness.rerender(keyed_list(&after_names));

        prop_assert_eq!(harness.item_texts(), after_names);

        let kept: HashSet<_> = before.iter().filter(|k| after.contains(*k)).collect();
        prop_assert_eq!(count(&ops, HostOp::is_insert), after.len() - kept.len());
        prop_assert_eq!(count(&ops, HostOp::is_remove), before.len() - kept.len());
        prop_assert!(count(&ops, HostOp::is_move) <= kept.len());

        let live: HashSet<_> = harness.item_nodes().into_iter().collect();
        prop_assert!(survivors.is_subset(&live));
    }
}
