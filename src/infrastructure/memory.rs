//! In-memory host document
//!
//! Arena-backed stand-in for the browser DOM. Every mutating call is recorded
//! in a journal so callers can check exactly what a render pass touched.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use regex::Regex;
use termtree::Tree;
use tracing::{instrument, trace};

use crate::domain::{Event, EventHandler};
use crate::infrastructure::error::{DocumentError, DocumentResult};
use crate::infrastructure::traits::Document;

/// Handle to a node in a [`MemoryDocument`].
pub type NodeId = Index;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

fn tag_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9._:\-]*$").expect("tag name pattern"))
}

/// Registered event listener.
#[derive(Clone)]
pub struct Listener {
    pub event: String,
    pub handler: EventHandler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("event", &self.event).finish()
    }
}

/// Payload of a live node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        /// Live value property, once written
        value: Option<String>,
        listeners: Vec<Listener>,
    },
    Text(String),
}

/// Live node in the arena.
#[derive(Debug)]
pub struct DomNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for detached nodes and the body
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// One mutating call made against the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { tag: String },
    CreateText { text: String },
    SetAttribute { name: String, value: String },
    RemoveAttribute { name: String },
    SetValue { value: String },
    AddEventListener { event: String },
    AppendChild,
    RemoveChild,
    ReplaceChild,
}

impl Mutation {
    /// True for attribute writes and removals.
    pub fn is_attribute(&self) -> bool {
        matches!(
            self,
            Mutation::SetAttribute { .. } | Mutation::RemoveAttribute { .. }
        )
    }

    /// True for calls that change the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::AppendChild | Mutation::RemoveChild | Mutation::ReplaceChild
        )
    }
}

#[derive(Debug)]
struct Inner {
    arena: Arena<DomNode>,
    body: Index,
    journal: Vec<Mutation>,
}

impl Inner {
    fn node(&self, idx: Index) -> DocumentResult<&DomNode> {
        self.arena.get(idx).ok_or(DocumentError::StaleHandle)
    }

    fn node_mut(&mut self, idx: Index) -> DocumentResult<&mut DomNode> {
        self.arena.get_mut(idx).ok_or(DocumentError::StaleHandle)
    }

    fn element_mut(
        &mut self,
        idx: Index,
    ) -> DocumentResult<(&mut BTreeMap<String, String>, &mut Option<String>, &mut Vec<Listener>)>
    {
        match &mut self.node_mut(idx)?.data {
            NodeData::Element {
                attributes,
                value,
                listeners,
                ..
            } => Ok((attributes, value, listeners)),
            NodeData::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    fn insert(&mut self, data: NodeData) -> Index {
        self.arena.insert(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    fn is_ancestor(&self, candidate: Index, of: Index) -> bool {
        let mut current = Some(of);
        while let Some(idx) = current {
            if idx == candidate {
                return true;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    /// Unlinks `child` from its parent, if it has one.
    fn detach(&mut self, child: Index) -> DocumentResult<()> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Frees a detached subtree; its handles become stale.
    fn drop_subtree(&mut self, root: Index) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if let Some(node) = self.arena.remove(idx) {
                stack.extend(node.children);
            }
        }
    }

    fn check_parent_is_element(&self, parent: Index) -> DocumentResult<()> {
        match self.node(parent)?.data {
            NodeData::Element { .. } => Ok(()),
            NodeData::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    fn check_insertable(&self, parent: Index, child: Index) -> DocumentResult<()> {
        self.check_parent_is_element(parent)?;
        self.node(child)?;
        if self.is_ancestor(child, parent) {
            return Err(DocumentError::Host(
                "the new child is an ancestor of the parent".to_string(),
            ));
        }
        Ok(())
    }
}

/// Arena-backed document rooted at a `body` element.
///
/// The mutation journal is unbounded: it keeps every mutating call until
/// [`take_mutations`](MemoryDocument::take_mutations) drains it. Long-running
/// callers drain it after each render.
#[derive(Debug)]
pub struct MemoryDocument {
    inner: RefCell<Inner>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let body = arena.insert(DomNode {
            data: NodeData::Element {
                tag: "body".to_string(),
                attributes: BTreeMap::new(),
                value: None,
                listeners: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        });
        Self {
            inner: RefCell::new(Inner {
                arena,
                body,
                journal: Vec::new(),
            }),
        }
    }

    /// Document root element.
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Creates `<tag id="id">` under the body and returns it.
    ///
    /// Convenience for mounting points; recorded in the journal like any other call.
    pub fn mount_point(&self, tag: &str, id: &str) -> DocumentResult<NodeId> {
        let el = self.create_element(tag)?;
        self.set_attribute(&el, "id", id)?;
        self.append_child(&self.body(), &el)?;
        Ok(el)
    }

    /// Journal of mutating calls since creation or the last [`take_mutations`](Self::take_mutations).
    pub fn mutations(&self) -> Vec<Mutation> {
        self.inner.borrow().journal.clone()
    }

    /// Returns and clears the journal.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.inner.borrow_mut().journal)
    }

    pub fn children(&self, node: NodeId) -> DocumentResult<Vec<NodeId>> {
        Ok(self.inner.borrow().node(node)?.children.clone())
    }

    pub fn tag(&self, node: NodeId) -> DocumentResult<Option<String>> {
        Ok(match &self.inner.borrow().node(node)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        })
    }

    /// Live value property, falling back to the `value` attribute.
    pub fn value(&self, node: NodeId) -> DocumentResult<Option<String>> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element {
                attributes, value, ..
            } => Ok(value.clone().or_else(|| attributes.get("value").cloned())),
            NodeData::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    /// Names of the events with a registered listener, in registration order.
    pub fn listeners(&self, node: NodeId) -> DocumentResult<Vec<String>> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element { listeners, .. } => {
                Ok(listeners.iter().map(|l| l.event.clone()).collect())
            }
            NodeData::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> DocumentResult<String> {
        let inner = self.inner.borrow();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(idx) = stack.pop() {
            let n = inner.node(idx)?;
            if let NodeData::Text(text) = &n.data {
                out.push_str(text);
            }
            stack.extend(n.children.iter().rev());
        }
        Ok(out)
    }

    /// First element under `root` (inclusive, document order) whose text content equals `text`.
    ///
    /// Picks the deepest match along the first matching path.
    pub fn find_by_text(&self, root: NodeId, text: &str) -> DocumentResult<Option<NodeId>> {
        let mut found = None;
        for idx in self.preorder(root)? {
            if self.tag(idx)?.is_some() && self.text_content(idx)? == text {
                found = Some(idx);
            } else if found.is_some() {
                break;
            }
        }
        Ok(found)
    }

    /// Fires `event` on `target`, calling its listeners in registration order.
    ///
    /// The event carries the target's live value, as [`value`](Self::value)
    /// reports it. Events are delivered to the target only; there is no bubbling.
    #[instrument(level = "debug", skip(self))]
    pub fn dispatch_event(&self, target: NodeId, event: &str) -> DocumentResult<usize> {
        // Listeners may reach back into the document, so no borrow is held while they run.
        let (handlers, value): (Vec<EventHandler>, Option<String>) =
            match &self.inner.borrow().node(target)?.data {
                NodeData::Element {
                    listeners,
                    attributes,
                    value,
                    ..
                } => (
                    listeners
                        .iter()
                        .filter(|l| l.event == event)
                        .map(|l| l.handler.clone())
                        .collect(),
                    value.clone().or_else(|| attributes.get("value").cloned()),
                ),
                NodeData::Text(_) => (Vec::new(), None),
            };
        let evt = Event {
            name: event.to_string(),
            value,
        };
        for handler in &handlers {
            handler(&evt);
        }
        Ok(handlers.len())
    }

    /// Nodes under `root` (inclusive) in document order.
    pub fn preorder(&self, root: NodeId) -> DocumentResult<Vec<NodeId>> {
        let inner = self.inner.borrow();
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let node = inner.node(idx)?;
            order.push(idx);
            // Push children in reverse order for left-to-right traversal
            stack.extend(node.children.iter().rev());
        }
        Ok(order)
    }

    /// HTML serialization of `node` and its subtree.
    pub fn outer_html(&self, node: NodeId) -> DocumentResult<String> {
        let inner = self.inner.borrow();
        let mut out = String::new();
        write_html(&inner, node, &mut out)?;
        Ok(out)
    }

    /// HTML serialization of the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> DocumentResult<String> {
        let inner = self.inner.borrow();
        let mut out = String::new();
        for &child in &inner.node(node)?.children {
            write_html(&inner, child, &mut out)?;
        }
        Ok(out)
    }

    /// Tree view of `node` and its subtree for terminal display.
    pub fn to_tree_string(&self, node: NodeId) -> DocumentResult<Tree<String>> {
        let inner = self.inner.borrow();
        build_tree(&inner, node)
    }

    fn record(&self, mutation: Mutation) {
        trace!(?mutation, "document mutation");
        self.inner.borrow_mut().journal.push(mutation);
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn open_tag(tag: &str, attributes: &BTreeMap<String, String>) -> String {
    if attributes.is_empty() {
        format!("<{}>", tag)
    } else {
        let attrs = attributes
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_attr(v)))
            .join(" ");
        format!("<{} {}>", tag, attrs)
    }
}

fn write_html(inner: &Inner, idx: Index, out: &mut String) -> DocumentResult<()> {
    let node = inner.node(idx)?;
    match &node.data {
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Element {
            tag, attributes, ..
        } => {
            out.push_str(&open_tag(tag, attributes));
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return Ok(());
            }
            for &child in &node.children {
                write_html(inner, child, out)?;
            }
            out.push_str(&format!("</{}>", tag));
        }
    }
    Ok(())
}

fn build_tree(inner: &Inner, idx: Index) -> DocumentResult<Tree<String>> {
    let node = inner.node(idx)?;
    let label = match &node.data {
        NodeData::Text(text) => format!("{:?}", text),
        NodeData::Element {
            tag, attributes, ..
        } => open_tag(tag, attributes),
    };
    let leaves = node
        .children
        .iter()
        .map(|&child| build_tree(inner, child))
        .collect::<DocumentResult<Vec<_>>>()?;
    Ok(Tree::new(label).with_leaves(leaves))
}

/// Parsed form of the supported selector subset: `#id`, `.class`, `tag`.
#[derive(Debug, PartialEq, Eq)]
enum Selector<'a> {
    Id(&'a str),
    Class(&'a str),
    Tag(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> DocumentResult<Self> {
        let selector = selector.trim();
        let parsed = if let Some(id) = selector.strip_prefix('#') {
            Selector::Id(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            Selector::Class(class)
        } else {
            Selector::Tag(selector)
        };
        let name = match parsed {
            Selector::Id(s) | Selector::Class(s) | Selector::Tag(s) => s,
        };
        if !tag_name_regex().is_match(name) {
            return Err(DocumentError::InvalidSelector(selector.to_string()));
        }
        Ok(parsed)
    }

    fn matches(&self, data: &NodeData) -> bool {
        let NodeData::Element {
            tag, attributes, ..
        } = data
        else {
            return false;
        };
        match self {
            Selector::Id(id) => attributes.get("id").is_some_and(|v| v == id),
            Selector::Class(class) => attributes
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == *class)),
            Selector::Tag(t) => tag.eq_ignore_ascii_case(t),
        }
    }
}

impl Document for MemoryDocument {
    type Handle = NodeId;

    fn create_element(&self, tag: &str) -> DocumentResult<NodeId> {
        if !tag_name_regex().is_match(tag) {
            return Err(DocumentError::InvalidTagName(tag.to_string()));
        }
        let tag = tag.to_ascii_lowercase();
        let idx = self.inner.borrow_mut().insert(NodeData::Element {
            tag: tag.clone(),
            attributes: BTreeMap::new(),
            value: None,
            listeners: Vec::new(),
        });
        self.record(Mutation::CreateElement { tag });
        Ok(idx)
    }

    fn create_text_node(&self, text: &str) -> DocumentResult<NodeId> {
        let idx = self
            .inner
            .borrow_mut()
            .insert(NodeData::Text(text.to_string()));
        self.record(Mutation::CreateText {
            text: text.to_string(),
        });
        Ok(idx)
    }

    fn set_attribute(&self, el: &NodeId, name: &str, value: &str) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let (attributes, _, _) = inner.element_mut(*el)?;
            attributes.insert(name.to_string(), value.to_string());
        }
        self.record(Mutation::SetAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn get_attribute(&self, el: &NodeId, name: &str) -> DocumentResult<Option<String>> {
        match &self.inner.borrow().node(*el)?.data {
            NodeData::Element { attributes, .. } => Ok(attributes.get(name).cloned()),
            NodeData::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    fn remove_attribute(&self, el: &NodeId, name: &str) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let (attributes, _, _) = inner.element_mut(*el)?;
            attributes.remove(name);
        }
        self.record(Mutation::RemoveAttribute {
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_value(&self, el: &NodeId, value: &str) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let (_, live_value, _) = inner.element_mut(*el)?;
            *live_value = Some(value.to_string());
        }
        self.record(Mutation::SetValue {
            value: value.to_string(),
        });
        Ok(())
    }

    fn add_event_listener(
        &self,
        el: &NodeId,
        event: &str,
        handler: EventHandler,
    ) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let (_, _, listeners) = inner.element_mut(*el)?;
            listeners.push(Listener {
                event: event.to_string(),
                handler,
            });
        }
        self.record(Mutation::AddEventListener {
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.check_insertable(*parent, *child)?;
            inner.detach(*child)?;
            inner.node_mut(*parent)?.children.push(*child);
            inner.node_mut(*child)?.parent = Some(*parent);
        }
        self.record(Mutation::AppendChild);
        Ok(())
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.node(*child)?.parent != Some(*parent) {
                return Err(DocumentError::NotAChild);
            }
            inner.detach(*child)?;
            inner.drop_subtree(*child);
        }
        self.record(Mutation::RemoveChild);
        Ok(())
    }

    fn replace_child(
        &self,
        parent: &NodeId,
        new_child: &NodeId,
        old_child: &NodeId,
    ) -> DocumentResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.node(*old_child)?.parent != Some(*parent) {
                return Err(DocumentError::NotAChild);
            }
            if new_child != old_child {
                inner.check_insertable(*parent, *new_child)?;
                inner.detach(*new_child)?;
                let position = inner
                    .node(*parent)?
                    .children
                    .iter()
                    .position(|c| c == old_child)
                    .ok_or(DocumentError::NotAChild)?;
                inner.node_mut(*parent)?.children[position] = *new_child;
                inner.node_mut(*new_child)?.parent = Some(*parent);
                inner.node_mut(*old_child)?.parent = None;
                inner.drop_subtree(*old_child);
            }
        }
        self.record(Mutation::ReplaceChild);
        Ok(())
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> DocumentResult<Option<NodeId>> {
        Ok(self.inner.borrow().node(*parent)?.children.get(index).copied())
    }

    fn child_count(&self, parent: &NodeId) -> DocumentResult<usize> {
        Ok(self.inner.borrow().node(*parent)?.children.len())
    }

    fn query_selector(&self, selector: &str) -> DocumentResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        let inner = self.inner.borrow();
        let mut stack = vec![inner.body];
        while let Some(idx) = stack.pop() {
            let node = inner.node(idx)?;
            if selector.matches(&node.data) {
                return Ok(Some(idx));
            }
            stack.extend(node.children.iter().rev());
        }
        Ok(None)
    }
}
