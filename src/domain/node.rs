//! Virtual tree nodes and their constructors.
//!
//! Trees are built fresh for every render and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Attribute name prefix that marks an event listener (`onclick` -> `click`).
pub const EVENT_PREFIX: &str = "on";

/// Name of the attribute whose changes are applied to the live value property.
pub const VALUE_ATTRIBUTE: &str = "value";

/// Event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event name without prefix, e.g. `click`
    pub name: String,
    /// Live `value` of the target element when the event fired, if it has one
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Shared event listener callback.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Value of a single attribute.
#[derive(Clone)]
pub enum AttrValue {
    /// Literal string attribute
    Text(String),
    /// Event listener, registered once when the element is created
    Handler(EventHandler),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Handler(_) => None,
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, AttrValue::Handler(_))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{:?}", s),
            AttrValue::Handler(_) => write!(f, "<handler>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<EventHandler> for AttrValue {
    fn from(handler: EventHandler) -> Self {
        AttrValue::Handler(handler)
    }
}

/// Wraps a closure as a listener attribute value.
pub fn handler<F>(f: F) -> AttrValue
where
    F: Fn(&Event) + 'static,
{
    AttrValue::Handler(Rc::new(f))
}

/// Attribute map; keys are unique and kept sorted.
pub type Attributes = BTreeMap<String, AttrValue>;

/// True if the attribute name follows the `on<event>` convention.
pub fn is_event_attr(name: &str) -> bool {
    name.starts_with(EVENT_PREFIX)
}

/// Event name for a listener attribute (`onclick` -> `click`).
pub fn event_name(attr: &str) -> &str {
    attr.strip_prefix(EVENT_PREFIX).unwrap_or(attr)
}

/// True if the attribute is an event listener that must be registered, not written.
pub fn is_event_listener(name: &str, value: &AttrValue) -> bool {
    is_event_attr(name) && value.is_handler()
}

/// Inline text content.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Text(String),
    Number(f64),
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Text(s) => f.write_str(s),
            Leaf::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// Formats a number the way a browser stringifies it for a text node.
///
/// Magnitudes in `[1e-6, 1e21)` print as plain decimals; everything else uses
/// exponent form with a signed exponent (`1e+21`, `1.5e-7`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return s.to_string();
    }
    if n == 0.0 {
        // covers -0
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return n.to_string();
    }
    let exponential = format!("{:e}", n);
    match exponential.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponential,
    }
}

/// Element node: tag, attributes and ordered children.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Adds a literal attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), AttrValue::Text(value.into()));
        self
    }

    /// Adds an event listener under `on<event>`.
    pub fn on<F>(mut self, event: &str, handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        self.attributes.insert(
            format!("{}{}", EVENT_PREFIX, event),
            AttrValue::Handler(Rc::new(handler)),
        );
        self
    }

    /// Adds an already shared listener under `on<event>`.
    pub fn on_handler(mut self, event: &str, handler: EventHandler) -> Self {
        self.attributes.insert(
            format!("{}{}", EVENT_PREFIX, event),
            AttrValue::Handler(handler),
        );
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// The declared `value` attribute, if any.
    pub fn value(&self) -> Option<&AttrValue> {
        self.attributes.get(VALUE_ATTRIBUTE)
    }
}

/// The tree unit: an element or a leaf.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Leaf(Leaf),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Leaf(Leaf::Text(s.into()))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Leaf(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Leaf(_) => &[],
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::text(s)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::text(s)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Leaf(Leaf::Number(n))
    }
}

// Integers beyond 2^53 round to the nearest f64, as they would in a browser.
macro_rules! impl_number_leaf {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Node {
                fn from(n: $t) -> Self {
                    Node::Leaf(Leaf::Number(n as f64))
                }
            }
        )*
    };
}

impl_number_leaf!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, f32);

/// Builds an element node.
///
/// No validation is done on `tag` or attribute names; a malformed tag is only
/// rejected by the host document when the tree is materialized.
///
/// # Example
/// ```
/// use rsdom::domain::{h, Attributes, Node};
///
/// let tree = h("p", Attributes::new(), vec![Node::from("count: "), Node::from(0)]);
/// assert_eq!(tree.children().len(), 2);
/// ```
pub fn h(tag: impl Into<String>, attributes: Attributes, children: Vec<Node>) -> Node {
    Node::Element(Element {
        tag: tag.into(),
        attributes,
        children,
    })
}

/// A node is empty only when it is absent.
///
/// A `0` number leaf and an empty text leaf are content, not absence.
pub fn is_empty(node: Option<&Node>) -> bool {
    node.is_none()
}

/// Builds an [`Attributes`] map from `name => value` pairs.
///
/// ```
/// use rsdom::attrs;
///
/// let a = attrs! { "class" => "btn", "type" => "button" };
/// assert_eq!(a.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::domain::Attributes::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::domain::Attributes::new();
        $(
            map.insert(
                ::std::string::String::from($name),
                $crate::domain::AttrValue::from($value),
            );
        )+
        map
    }};
}
