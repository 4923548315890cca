//! Domain layer: the virtual tree model
//!
//! This layer is independent of any host document (no live nodes, no I/O).

pub mod change;
pub mod node;

pub use change::{classify, ChangeKind};
pub use node::{
    event_name, h, handler, is_empty, is_event_attr, is_event_listener, AttrValue, Attributes,
    Element, Event, EventHandler, Leaf, Node, EVENT_PREFIX, VALUE_ATTRIBUTE,
};
