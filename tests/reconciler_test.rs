//! Integration tests for the reconciler against the in-memory document.
//!
//! Every test mounts a `div#app` under the body and renders into it, so the
//! tree under test is always child 0 of the mount point.

use std::cell::Cell;
use std::rc::Rc;

use rstest::rstest;

use rsdom::application::Reconciler;
use rsdom::attrs;
use rsdom::domain::{h, handler, is_empty, Element, Node};
use rsdom::infrastructure::{Document, DocumentError, MemoryDocument, Mutation, NodeId};
use rsdom::util::testing;

fn setup() -> (Rc<MemoryDocument>, Reconciler<MemoryDocument>, NodeId) {
    testing::init_test_setup();
    let doc = Rc::new(MemoryDocument::new());
    let mount = doc.mount_point("div", "app").unwrap();
    doc.take_mutations();
    let reconciler = Reconciler::new(Rc::clone(&doc));
    (doc, reconciler, mount)
}

/// Renders `first`, clears the journal, then renders `second` over it.
fn rerender(first: &Node, second: &Node) -> (Rc<MemoryDocument>, NodeId, Vec<Mutation>) {
    let (doc, reconciler, mount) = setup();
    reconciler.render(&mount, None, first).unwrap();
    doc.take_mutations();
    reconciler.render(&mount, Some(first), second).unwrap();
    let mutations = doc.take_mutations();
    (doc, mount, mutations)
}

fn sample_tree() -> Node {
    Element::new("div")
        .attr("class", "card")
        .child(Element::new("h1").child("title"))
        .child(Element::new("p").child(0))
        .child(
            Element::new("input")
                .attr("type", "text")
                .attr("value", "hello")
                .on("input", |_| {}),
        )
        .child(
            Element::new("ul")
                .child(Element::new("li").child("one"))
                .child(Element::new("li").child(2.5)),
        )
        .into()
}

// ============================================================
// Idempotence
// ============================================================

#[test]
fn given_same_tree_as_old_and_new_when_reconciling_then_no_mutation() {
    // Arrange
    let tree = sample_tree();

    // Act
    let (doc, mount, mutations) = rerender(&tree, &tree);

    // Assert
    assert!(mutations.is_empty(), "unexpected mutations: {:?}", mutations);
    assert_eq!(doc.child_count(&mount).unwrap(), 1);
}

#[test]
fn given_equal_but_separately_built_trees_when_reconciling_then_no_mutation() {
    // Handlers are compared as markers, so fresh closures do not count as a change.
    let (_doc, _mount, mutations) = rerender(&sample_tree(), &sample_tree());

    assert!(mutations.is_empty(), "unexpected mutations: {:?}", mutations);
}

// ============================================================
// Materialize / children equivalence
// ============================================================

#[test]
fn given_no_prior_state_when_reconciling_then_matches_materialize() {
    // Arrange
    let tree = sample_tree();
    let (doc, reconciler, mount) = setup();
    let other = Rc::new(MemoryDocument::new());
    let materializer = Reconciler::new(Rc::clone(&other));

    // Act
    reconciler.reconcile(&mount, None, Some(&tree), 0).unwrap();
    let live = materializer.materialize(&tree).unwrap();

    // Assert
    assert_eq!(
        doc.inner_html(mount).unwrap(),
        other.outer_html(live).unwrap()
    );
    assert_eq!(
        doc.inner_html(mount).unwrap(),
        r#"<div class="card"><h1>title</h1><p>0</p><input type="text" value="hello"><ul><li>one</li><li>2.5</li></ul></div>"#
    );
}

#[test]
fn given_listener_attribute_when_materializing_then_registers_listener() {
    let (doc, reconciler, _mount) = setup();
    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    let tree: Node = Element::new("button")
        .on("click", move |_| counter.set(counter.get() + 1))
        .child("go")
        .into();

    let live = reconciler.materialize(&tree).unwrap();
    let fired = doc.dispatch_event(live, "click").unwrap();

    assert_eq!(fired, 1);
    assert_eq!(clicks.get(), 1);
    assert_eq!(doc.get_attribute(&live, "onclick").unwrap(), None);
}

// ============================================================
// Empty vs zero
// ============================================================

#[test]
fn given_zero_leaf_when_rendering_then_renders_text_zero() {
    // Arrange
    let (doc, reconciler, mount) = setup();
    let tree = h("p", attrs! {}, vec![Node::from(0)]);

    // Act
    reconciler.render(&mount, None, &tree).unwrap();

    // Assert
    assert!(!is_empty(Some(&Node::from(0))));
    assert!(is_empty(None));
    assert_eq!(doc.inner_html(mount).unwrap(), "<p>0</p>");
}

#[test]
fn given_count_changing_from_zero_when_rerendering_then_replaces_text() {
    let old = h("p", attrs! {}, vec![Node::from(0)]);
    let new = h("p", attrs! {}, vec![Node::from(1)]);

    let (doc, mount, mutations) = rerender(&old, &new);

    assert_eq!(doc.inner_html(mount).unwrap(), "<p>1</p>");
    assert_eq!(
        mutations,
        vec![
            Mutation::CreateText {
                text: "1".to_string()
            },
            Mutation::ReplaceChild
        ]
    );
}

#[rstest]
#[case(Node::from(0), Node::from("0"))]
#[case(Node::from("1"), Node::from(1))]
fn given_number_and_text_with_same_rendering_when_rerendering_then_replaces(
    #[case] old: Node,
    #[case] new: Node,
) {
    // Number and Text are different value categories.
    let (_doc, _mount, mutations) = rerender(&old, &new);

    assert_eq!(mutations.last(), Some(&Mutation::ReplaceChild));
}

// ============================================================
// Replacement terminality
// ============================================================

#[test]
fn given_different_tags_when_reconciling_then_replaces_subtree_without_child_diff() {
    // Arrange
    let (doc, reconciler, mount) = setup();
    let old: Node = Element::new("div")
        .child(Element::new("span").child("a"))
        .into();
    let new: Node = Element::new("section")
        .child(Element::new("span").child("a"))
        .into();
    reconciler.render(&mount, None, &old).unwrap();
    let old_root = doc.child_at(&mount, 0).unwrap().unwrap();
    let old_span = doc.child_at(&old_root, 0).unwrap().unwrap();
    doc.take_mutations();

    // Act
    reconciler.render(&mount, Some(&old), &new).unwrap();

    // Assert
    let mutations = doc.take_mutations();
    let replaces = mutations
        .iter()
        .filter(|m| **m == Mutation::ReplaceChild)
        .count();
    assert_eq!(replaces, 1);
    assert!(!mutations.contains(&Mutation::RemoveChild));
    assert_eq!(doc.tag(old_span), Err(DocumentError::StaleHandle));
    assert_eq!(
        doc.inner_html(mount).unwrap(),
        "<section><span>a</span></section>"
    );
}

#[test]
fn given_element_replaced_by_text_when_reconciling_then_replaces() {
    let old: Node = Element::new("b").child("x").into();
    let new = Node::from("x");

    let (doc, mount, mutations) = rerender(&old, &new);

    assert_eq!(
        mutations,
        vec![
            Mutation::CreateText {
                text: "x".to_string()
            },
            Mutation::ReplaceChild
        ]
    );
    assert_eq!(doc.inner_html(mount).unwrap(), "x");
}

// ============================================================
// Value path isolation
// ============================================================

#[test]
fn given_input_value_change_when_reconciling_then_only_value_property_changes() {
    // Arrange
    let old: Node = Element::new("input").attr("value", "a").into();
    let new: Node = Element::new("input").attr("value", "b").into();

    // Act
    let (doc, mount, mutations) = rerender(&old, &new);

    // Assert
    assert_eq!(
        mutations,
        vec![Mutation::SetValue {
            value: "b".to_string()
        }]
    );
    assert!(!mutations.iter().any(Mutation::is_attribute));
    let input = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.value(input).unwrap(), Some("b".to_string()));
    assert_eq!(
        doc.get_attribute(&input, "value").unwrap(),
        Some("a".to_string())
    );
}

#[test]
fn given_value_change_with_other_changes_when_reconciling_then_only_value_is_written() {
    // Value is terminal: class and children of the new node are not applied.
    let old: Node = Element::new("input")
        .attr("value", "a")
        .attr("class", "x")
        .into();
    let new: Node = Element::new("input")
        .attr("value", "b")
        .attr("class", "y")
        .into();

    let (doc, mount, mutations) = rerender(&old, &new);

    assert_eq!(mutations.len(), 1);
    let input = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(
        doc.get_attribute(&input, "class").unwrap(),
        Some("x".to_string())
    );
}

#[test]
fn given_value_removed_when_reconciling_then_writes_empty_value() {
    let old: Node = Element::new("input").attr("value", "a").into();
    let new: Node = Element::new("input").into();

    let (_doc, _mount, mutations) = rerender(&old, &new);

    assert_eq!(
        mutations,
        vec![Mutation::SetValue {
            value: String::new()
        }]
    );
}

// ============================================================
// Attribute churn
// ============================================================

#[test]
fn given_attribute_set_change_when_reconciling_then_old_removed_and_new_set() {
    // Arrange
    let old: Node = Element::new("div").attr("class", "x").into();
    let new: Node = Element::new("div").attr("id", "y").into();

    // Act
    let (doc, mount, mutations) = rerender(&old, &new);

    // Assert
    let div = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.get_attribute(&div, "class").unwrap(), None);
    assert_eq!(
        doc.get_attribute(&div, "id").unwrap(),
        Some("y".to_string())
    );
    assert_eq!(
        mutations,
        vec![
            Mutation::RemoveAttribute {
                name: "class".to_string()
            },
            Mutation::SetAttribute {
                name: "id".to_string(),
                value: "y".to_string()
            },
        ]
    );
}

#[test]
fn given_attribute_change_when_reconciling_then_children_are_still_diffed() {
    let old: Node = Element::new("div")
        .attr("class", "x")
        .child(Element::new("span").child("old"))
        .into();
    let new: Node = Element::new("div")
        .attr("class", "y")
        .child(Element::new("span").child("new"))
        .into();

    let (doc, mount, _mutations) = rerender(&old, &new);

    assert_eq!(
        doc.inner_html(mount).unwrap(),
        r#"<div class="y"><span>new</span></div>"#
    );
}

// ============================================================
// Positional child diffing
// ============================================================

#[test]
fn given_trailing_child_dropped_when_reconciling_then_removes_exactly_index_one() {
    // Arrange
    let old = h("ul", attrs! {}, vec!["A".into(), "B".into()]);
    let new = h("ul", attrs! {}, vec!["A".into()]);

    // Act
    let (doc, mount, mutations) = rerender(&old, &new);

    // Assert
    assert_eq!(mutations, vec![Mutation::RemoveChild]);
    let ul = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.child_count(&ul).unwrap(), 1);
    assert_eq!(doc.inner_html(ul).unwrap(), "A");
}

#[test]
fn given_child_added_when_reconciling_then_appends_exactly_one_child() {
    let old = h("ul", attrs! {}, vec!["A".into()]);
    let new = h("ul", attrs! {}, vec!["A".into(), "B".into()]);

    let (doc, mount, mutations) = rerender(&old, &new);

    assert_eq!(
        mutations,
        vec![
            Mutation::CreateText {
                text: "B".to_string()
            },
            Mutation::AppendChild
        ]
    );
    let ul = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.inner_html(ul).unwrap(), "AB");
}

#[test]
fn given_several_trailing_children_dropped_when_reconciling_then_all_are_removed() {
    let old = h(
        "ul",
        attrs! {},
        vec!["A".into(), "B".into(), "C".into(), "D".into()],
    );
    let new = h("ul", attrs! {}, vec!["A".into()]);

    let (doc, mount, mutations) = rerender(&old, &new);

    assert_eq!(mutations, vec![Mutation::RemoveChild; 3]);
    let ul = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.inner_html(ul).unwrap(), "A");
}

#[test]
fn given_reordered_children_when_reconciling_then_patched_by_position() {
    // No identity tracking: each index is diffed against the same index.
    let old = h("ul", attrs! {}, vec!["A".into(), "B".into()]);
    let new = h("ul", attrs! {}, vec!["B".into(), "A".into()]);

    let (doc, mount, mutations) = rerender(&old, &new);

    let replaces = mutations
        .iter()
        .filter(|m| **m == Mutation::ReplaceChild)
        .count();
    assert_eq!(replaces, 2);
    let ul = doc.child_at(&mount, 0).unwrap().unwrap();
    assert_eq!(doc.inner_html(ul).unwrap(), "BA");
}

// ============================================================
// Listener attach-once on the attribute path
// ============================================================

#[test]
fn given_handler_swapped_with_attribute_change_when_reconciling_then_first_listener_stays() {
    // Arrange
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let (f, s) = (Rc::clone(&first), Rc::clone(&second));
    let old: Node = Element::new("button")
        .attr("class", "x")
        .on("click", move |_| f.set(f.get() + 1))
        .into();
    let new: Node = Element::new("button")
        .attr("class", "y")
        .on("click", move |_| s.set(s.get() + 1))
        .into();

    // Act
    let (doc, mount, mutations) = rerender(&old, &new);
    let button = doc.child_at(&mount, 0).unwrap().unwrap();
    doc.dispatch_event(button, "click").unwrap();

    // Assert
    assert!(!mutations
        .iter()
        .any(|m| matches!(m, Mutation::AddEventListener { .. })));
    assert_eq!(doc.listeners(button).unwrap(), vec!["click".to_string()]);
    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 0);
}

#[test]
fn given_listener_added_with_attribute_change_when_reconciling_then_not_registered() {
    let old: Node = Element::new("button").attr("class", "x").into();
    let new: Node = Element::new("button")
        .attr("class", "y")
        .on("click", |_| {})
        .into();

    let (doc, mount, _mutations) = rerender(&old, &new);
    let button = doc.child_at(&mount, 0).unwrap().unwrap();

    assert!(doc.listeners(button).unwrap().is_empty());
    assert_eq!(doc.dispatch_event(button, "click").unwrap(), 0);
}

#[test]
fn given_handler_under_plain_attribute_name_when_materializing_then_skipped() {
    let (doc, reconciler, _mount) = setup();
    let tree = h("div", attrs! { "title" => handler(|_| {}) }, vec![]);

    let live = reconciler.materialize(&tree).unwrap();

    assert_eq!(doc.get_attribute(&live, "title").unwrap(), None);
    assert!(doc.listeners(live).unwrap().is_empty());
}

// ============================================================
// Host errors
// ============================================================

#[test]
fn given_invalid_tag_when_rendering_then_error_propagates_unmodified() {
    let (_doc, reconciler, mount) = setup();
    let tree: Node = Element::new("div").child(Element::new("1bad")).into();

    let result = reconciler.render(&mount, None, &tree);

    assert_eq!(
        result,
        Err(DocumentError::InvalidTagName("1bad".to_string()))
    );
}
