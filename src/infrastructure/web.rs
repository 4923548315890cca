//! Browser host document through `web-sys`

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element as DomElement, HtmlInputElement, Node as DomNode};

use crate::domain::{Event, EventHandler};
use crate::infrastructure::error::{DocumentError, DocumentResult};
use crate::infrastructure::traits::Document;

fn host_err(err: JsValue) -> DocumentError {
    DocumentError::Host(format!("{:?}", err))
}

fn as_element(node: &DomNode) -> DocumentResult<&DomElement> {
    node.dyn_ref::<DomElement>()
        .ok_or(DocumentError::NotAnElement)
}

/// The page's `window.document`.
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new() -> DocumentResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| DocumentError::Host("no window.document".to_string()))?;
        Ok(Self { document })
    }
}

impl Document for WebDocument {
    type Handle = DomNode;

    fn create_element(&self, tag: &str) -> DocumentResult<DomNode> {
        self.document
            .create_element(tag)
            .map(Into::into)
            .map_err(|_| DocumentError::InvalidTagName(tag.to_string()))
    }

    fn create_text_node(&self, text: &str) -> DocumentResult<DomNode> {
        Ok(self.document.create_text_node(text).into())
    }

    fn set_attribute(&self, el: &DomNode, name: &str, value: &str) -> DocumentResult<()> {
        as_element(el)?.set_attribute(name, value).map_err(host_err)
    }

    fn get_attribute(&self, el: &DomNode, name: &str) -> DocumentResult<Option<String>> {
        Ok(as_element(el)?.get_attribute(name))
    }

    fn remove_attribute(&self, el: &DomNode, name: &str) -> DocumentResult<()> {
        as_element(el)?.remove_attribute(name).map_err(host_err)
    }

    fn set_value(&self, el: &DomNode, value: &str) -> DocumentResult<()> {
        match el.dyn_ref::<HtmlInputElement>() {
            Some(input) => {
                input.set_value(value);
                Ok(())
            }
            // textarea, select and friends expose `value` too
            None => js_sys_set(el, "value", value),
        }
    }

    fn add_event_listener(
        &self,
        el: &DomNode,
        event: &str,
        handler: EventHandler,
    ) -> DocumentResult<()> {
        let name = event.to_string();
        let closure = Closure::<dyn Fn(web_sys::Event)>::new(move |event: web_sys::Event| {
            let value = event
                .target()
                .and_then(|target| js_sys::Reflect::get(&target, &JsValue::from_str("value")).ok())
                .and_then(|value| value.as_string());
            handler(&Event {
                name: name.clone(),
                value,
            });
        });
        el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(host_err)?;
        // attach-once: the listener lives as long as the page
        closure.forget();
        Ok(())
    }

    fn append_child(&self, parent: &DomNode, child: &DomNode) -> DocumentResult<()> {
        parent.append_child(child).map(|_| ()).map_err(host_err)
    }

    fn remove_child(&self, parent: &DomNode, child: &DomNode) -> DocumentResult<()> {
        parent
            .remove_child(child)
            .map(|_| ())
            .map_err(|_| DocumentError::NotAChild)
    }

    fn replace_child(
        &self,
        parent: &DomNode,
        new_child: &DomNode,
        old_child: &DomNode,
    ) -> DocumentResult<()> {
        parent
            .replace_child(new_child, old_child)
            .map(|_| ())
            .map_err(host_err)
    }

    fn child_at(&self, parent: &DomNode, index: usize) -> DocumentResult<Option<DomNode>> {
        let index = u32::try_from(index).map_err(|_| DocumentError::ChildNotFound { index })?;
        Ok(parent.child_nodes().get(index))
    }

    fn child_count(&self, parent: &DomNode) -> DocumentResult<usize> {
        Ok(parent.child_nodes().length() as usize)
    }

    fn query_selector(&self, selector: &str) -> DocumentResult<Option<DomNode>> {
        self.document
            .query_selector(selector)
            .map(|found| found.map(Into::into))
            .map_err(|_| DocumentError::InvalidSelector(selector.to_string()))
    }
}

fn js_sys_set(target: &DomNode, property: &str, value: &str) -> DocumentResult<()> {
    js_sys::Reflect::set(target, &JsValue::from_str(property), &JsValue::from_str(value))
        .map(|_| ())
        .map_err(host_err)
}
