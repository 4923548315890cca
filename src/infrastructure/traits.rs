//! Host document boundary
//!
//! The reconciler only touches the live document through [`Document`], so it
//! can run against the browser DOM or the in-memory document used by tests
//! and the CLI.

use std::fmt::Debug;

use crate::domain::EventHandler;
use crate::infrastructure::error::DocumentResult;

/// Live document API used for all side effects of rendering.
///
/// Methods take `&self`: like the browser DOM, implementations mutate through
/// interior mutability, which lets event listeners run while other code holds
/// a reference to the document.
pub trait Document {
    /// Reference to a live node.
    type Handle: Clone + Debug + PartialEq;

    /// Create a detached element; rejects malformed tag names.
    fn create_element(&self, tag: &str) -> DocumentResult<Self::Handle>;

    /// Create a detached text node.
    fn create_text_node(&self, text: &str) -> DocumentResult<Self::Handle>;

    /// Set a literal attribute on an element.
    fn set_attribute(&self, el: &Self::Handle, name: &str, value: &str) -> DocumentResult<()>;

    /// Read a literal attribute from an element.
    fn get_attribute(&self, el: &Self::Handle, name: &str) -> DocumentResult<Option<String>>;

    /// Remove a literal attribute; removing a missing attribute is not an error.
    fn remove_attribute(&self, el: &Self::Handle, name: &str) -> DocumentResult<()>;

    /// Write the live `value` property (distinct from the `value` attribute).
    fn set_value(&self, el: &Self::Handle, value: &str) -> DocumentResult<()>;

    /// Register a listener for `event` (name without the `on` prefix).
    fn add_event_listener(
        &self,
        el: &Self::Handle,
        event: &str,
        handler: EventHandler,
    ) -> DocumentResult<()>;

    /// Append `child` as the last child of `parent`, detaching it first if needed.
    fn append_child(&self, parent: &Self::Handle, child: &Self::Handle) -> DocumentResult<()>;

    /// Remove `child` from `parent`.
    fn remove_child(&self, parent: &Self::Handle, child: &Self::Handle) -> DocumentResult<()>;

    /// Put `new_child` in place of `old_child` under `parent`.
    fn replace_child(
        &self,
        parent: &Self::Handle,
        new_child: &Self::Handle,
        old_child: &Self::Handle,
    ) -> DocumentResult<()>;

    /// Child of `parent` at `index`, if any.
    fn child_at(&self, parent: &Self::Handle, index: usize) -> DocumentResult<Option<Self::Handle>>;

    /// Number of children of `parent`.
    fn child_count(&self, parent: &Self::Handle) -> DocumentResult<usize>;

    /// First element matching `selector` in document order.
    fn query_selector(&self, selector: &str) -> DocumentResult<Option<Self::Handle>>;
}
