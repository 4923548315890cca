//! Change classification between two versions of a node.

use itertools::Itertools;

use crate::domain::node::{AttrValue, Attributes, Element, Leaf, Node};

/// Kind of change between an old and a new node at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Nothing detected at this level
    None,
    /// Different value category (element, text, number)
    Type,
    /// Both leaves, different content
    Text,
    /// Both elements, different tags
    Node,
    /// Same tag, different `value` attribute
    Value,
    /// Same tag and value, different attribute set
    Attr,
}

#[derive(Debug, PartialEq, Eq)]
enum Category {
    Element,
    Text,
    Number,
}

fn category(node: &Node) -> Category {
    match node {
        Node::Element(_) => Category::Element,
        Node::Leaf(Leaf::Text(_)) => Category::Text,
        Node::Leaf(Leaf::Number(_)) => Category::Number,
    }
}

/// Classifies the change from `old` to `new`; first matching rule wins.
pub fn classify(old: &Node, new: &Node) -> ChangeKind {
    if category(old) != category(new) {
        return ChangeKind::Type;
    }

    match (old, new) {
        (Node::Leaf(a), Node::Leaf(b)) => {
            if a != b {
                ChangeKind::Text
            } else {
                ChangeKind::None
            }
        }
        (Node::Element(a), Node::Element(b)) => classify_elements(a, b),
        _ => ChangeKind::Type,
    }
}

fn classify_elements(a: &Element, b: &Element) -> ChangeKind {
    if a.tag != b.tag {
        return ChangeKind::Node;
    }
    if value_fingerprint(a.value()) != value_fingerprint(b.value()) {
        return ChangeKind::Value;
    }
    if attr_fingerprint(&a.attributes) != attr_fingerprint(&b.attributes) {
        return ChangeKind::Attr;
    }
    ChangeKind::None
}

/// Comparable form of an attribute value; listeners have no comparable content.
fn value_fingerprint(value: Option<&AttrValue>) -> Option<Option<&str>> {
    value.map(AttrValue::as_text)
}

/// Sorted `(name, text)` entries of an attribute set.
///
/// A listener contributes its name only, so swapping one closure for another
/// is not a change while adding or dropping a listener key is.
pub fn attr_fingerprint(attributes: &Attributes) -> Vec<(&str, Option<&str>)> {
    attributes
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_text()))
        .sorted()
        .collect()
}
