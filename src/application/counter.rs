//! Counter demo app

use std::rc::Rc;

use tracing::info;

use crate::application::controller::{ActionTree, App, AppParams, Dispatcher, Root};
use crate::application::scheduler::TaskQueue;
use crate::application::ApplicationResult;
use crate::domain::{Element, Node};
use crate::infrastructure::Document;

pub const TITLE: &str = "Virtual DOM framework";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CounterState {
    pub count: i64,
}

pub fn counter_actions() -> ActionTree<CounterState> {
    ActionTree::new()
        .with("increment", |s: &mut CounterState| s.count += 1)
        .with("decrement", |s: &mut CounterState| s.count -= 1)
        .with("reset", |s: &mut CounterState| s.count = 0)
        .with("show", |s: &mut CounterState| info!(state = ?s, "show"))
}

fn button<D: Document + 'static>(
    label: &str,
    action: &str,
    actions: &Dispatcher<CounterState, D>,
) -> Element {
    Element::new("button")
        .attr("style", "margin:3px")
        .attr("type", "button")
        .on_handler("click", actions.handler(action))
        .child(label)
}

pub fn counter_view<D: Document + 'static>(
    state: &CounterState,
    actions: &Dispatcher<CounterState, D>,
) -> Node {
    Element::new("div")
        .child(Element::new("h1").child(TITLE))
        .child(Element::new("p").child(state.count))
        .child(
            Element::new("div")
                .child(button("count up", "increment", actions))
                .child(button("count down", "decrement", actions))
                .child(button("reset", "reset", actions)),
        )
        .child(Element::new("div").child(button("console log", "show", actions)))
        .into()
}

/// Mounts the counter under `root`, starting from `state`.
pub fn counter_app<D: Document + 'static>(
    doc: Rc<D>,
    queue: Rc<TaskQueue>,
    root: Root<D::Handle>,
    state: CounterState,
) -> ApplicationResult<App<CounterState, D>> {
    App::new(
        doc,
        queue,
        AppParams {
            root,
            state,
            actions: counter_actions(),
            view: Rc::new(counter_view::<D>),
        },
    )
}
