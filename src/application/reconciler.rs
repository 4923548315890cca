//! Reconciler: diffs two virtual trees and patches the live document
//!
//! Children are compared strictly by position. There is no identity tracking
//! across reorders: the child at index `i` of the old tree is always diffed
//! against the child at index `i` of the new tree.

use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::{debug, instrument, trace, warn};

use crate::domain::{
    classify, event_name, is_event_attr, is_event_listener, AttrValue, Attributes, ChangeKind,
    Element, Node,
};
use crate::infrastructure::{Document, DocumentError, DocumentResult};

/// Applies virtual trees to a host document.
///
/// Host errors are returned unmodified and abort the pass; there is no retry
/// or rollback, so a failed pass can leave the live subtree partially patched.
pub struct Reconciler<D: Document> {
    doc: Rc<D>,
}

impl<D: Document> Clone for Reconciler<D> {
    fn clone(&self) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
        }
    }
}

impl<D: Document> Reconciler<D> {
    pub fn new(doc: Rc<D>) -> Self {
        Self { doc }
    }

    /// Builds a detached live subtree for `node`.
    ///
    /// Leaves become text nodes. Elements get every attribute applied (listeners
    /// registered, everything else written literally) and every child appended in order.
    #[instrument(level = "trace", skip_all)]
    pub fn materialize(&self, node: &Node) -> DocumentResult<D::Handle> {
        match node {
            Node::Leaf(leaf) => self.doc.create_text_node(&leaf.to_string()),
            Node::Element(el) => {
                let handle = self.doc.create_element(&el.tag)?;
                self.set_attributes(&handle, &el.attributes)?;
                for child in &el.children {
                    let live = self.materialize(child)?;
                    self.doc.append_child(&handle, &live)?;
                }
                Ok(handle)
            }
        }
    }

    /// Patches the child of `parent` at `position` from `old` to `new`.
    ///
    /// `None` stands for an absent node: an absent `old` appends `new`, an
    /// absent `new` removes the live child.
    #[instrument(level = "trace", skip(self, parent, old, new))]
    pub fn reconcile(
        &self,
        parent: &D::Handle,
        old: Option<&Node>,
        new: Option<&Node>,
        position: usize,
    ) -> DocumentResult<()> {
        let Some(old) = old else {
            if let Some(new) = new {
                trace!("append");
                let live = self.materialize(new)?;
                self.doc.append_child(parent, &live)?;
            }
            return Ok(());
        };

        let target = self
            .doc
            .child_at(parent, position)?
            .ok_or(DocumentError::ChildNotFound { index: position })?;

        let Some(new) = new else {
            trace!("remove");
            return self.doc.remove_child(parent, &target);
        };

        let change = classify(old, new);
        match change {
            ChangeKind::Type | ChangeKind::Text | ChangeKind::Node => {
                debug!(?change, "replace");
                let fresh = self.materialize(new)?;
                return self.doc.replace_child(parent, &fresh, &target);
            }
            ChangeKind::Value => {
                let value = new
                    .as_element()
                    .and_then(Element::value)
                    .and_then(AttrValue::as_text)
                    .unwrap_or_default();
                debug!(value, "update value");
                return self.doc.set_value(&target, value);
            }
            ChangeKind::Attr => {
                if let (Node::Element(o), Node::Element(n)) = (old, new) {
                    debug!("update attributes");
                    self.update_attributes(&target, &o.attributes, &n.attributes)?;
                }
            }
            ChangeKind::None => {}
        }

        if let (Node::Element(o), Node::Element(n)) = (old, new) {
            self.reconcile_children(&target, &o.children, &n.children)?;
        }
        Ok(())
    }

    /// First render or re-render of `next` as child 0 of `root`.
    pub fn render(&self, root: &D::Handle, previous: Option<&Node>, next: &Node) -> DocumentResult<()> {
        self.reconcile(root, previous, Some(next), 0)
    }

    fn reconcile_children(&self, target: &D::Handle, old: &[Node], new: &[Node]) -> DocumentResult<()> {
        let shared = old.len().min(new.len());
        for i in 0..shared {
            self.reconcile(target, Some(&old[i]), Some(&new[i]), i)?;
        }
        for (i, child) in new.iter().enumerate().skip(shared) {
            self.reconcile(target, None, Some(child), i)?;
        }
        // Highest index first, so every position still exists when it is removed.
        for i in (shared..old.len()).rev() {
            self.reconcile(target, Some(&old[i]), None, i)?;
        }
        Ok(())
    }

    fn set_attributes(&self, target: &D::Handle, attributes: &Attributes) -> DocumentResult<()> {
        for (name, value) in attributes {
            match value {
                AttrValue::Handler(handler) if is_event_attr(name) => {
                    self.doc
                        .add_event_listener(target, event_name(name), Rc::clone(handler))?;
                }
                AttrValue::Text(text) if !is_event_attr(name) => {
                    self.doc.set_attribute(target, name, text)?;
                }
                _ => debug!(name = name.as_str(), "skipping attribute that is neither text nor listener"),
            }
        }
        Ok(())
    }

    /// Replaces the literal attributes of `target`; listeners are left as registered.
    fn update_attributes(
        &self,
        target: &D::Handle,
        old: &Attributes,
        new: &Attributes,
    ) -> DocumentResult<()> {
        if listener_names(old) != listener_names(new) {
            warn!(
                old = ?listener_names(old),
                new = ?listener_names(new),
                "listener set changed; listeners are attached once and not updated"
            );
        }

        for name in old.keys().filter(|name| !is_event_attr(name)) {
            self.doc.remove_attribute(target, name)?;
        }
        for (name, value) in new {
            if let AttrValue::Text(text) = value {
                if !is_event_attr(name) {
                    self.doc.set_attribute(target, name, text)?;
                }
            }
        }
        Ok(())
    }
}

fn listener_names(attributes: &Attributes) -> BTreeSet<&str> {
    attributes
        .iter()
        .filter(|(name, value)| is_event_listener(name, value))
        .map(|(name, _)| name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MemoryDocument, Mutation};

    fn setup() -> (Rc<MemoryDocument>, Reconciler<MemoryDocument>) {
        let doc = Rc::new(MemoryDocument::new());
        let reconciler = Reconciler::new(Rc::clone(&doc));
        (doc, reconciler)
    }

    #[test]
    fn given_absent_old_and_new_when_reconciling_then_nothing_happens() {
        let (doc, reconciler) = setup();
        let body = doc.body();

        reconciler.reconcile(&body, None, None, 0).unwrap();

        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn given_missing_live_child_when_reconciling_then_child_not_found() {
        let (doc, reconciler) = setup();
        let body = doc.body();
        let old = Node::from("a");

        let result = reconciler.reconcile(&body, Some(&old), Some(&Node::from("b")), 3);

        assert_eq!(result, Err(DocumentError::ChildNotFound { index: 3 }));
    }

    #[test]
    fn given_invalid_tag_when_materializing_then_host_error_propagates() {
        let (_doc, reconciler) = setup();

        let result = reconciler.materialize(&Element::new("not a tag").into());

        assert_eq!(
            result,
            Err(DocumentError::InvalidTagName("not a tag".to_string()))
        );
    }

    #[test]
    fn given_text_under_event_name_when_materializing_then_not_written() {
        let (doc, reconciler) = setup();
        let node: Node = Element::new("a").attr("onclick", "alert(1)").into();

        let live = reconciler.materialize(&node).unwrap();

        assert_eq!(doc.get_attribute(&live, "onclick").unwrap(), None);
        assert_eq!(
            doc.mutations(),
            vec![Mutation::CreateElement {
                tag: "a".to_string()
            }]
        );
    }
}
