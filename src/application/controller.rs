//! App controller: state, actions, view and coalesced rendering
//!
//! A dispatch runs the named action against the state, recomputes the next
//! tree and requests a render. Requests made while a render is pending are
//! no-ops; the pending render runs on the next [`TaskQueue`] turn, patches the
//! document once and clears the flag.

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, instrument, trace, warn};

use crate::application::reconciler::Reconciler;
use crate::application::scheduler::TaskQueue;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Event, EventHandler, Node};
use crate::infrastructure::Document;

/// State transition run by a dispatch, with the data passed along with it.
pub type Action<S> = Rc<dyn Fn(&mut S, &[String])>;

/// Produces the tree for the current state.
pub type View<S, D> = Rc<dyn Fn(&S, &Dispatcher<S, D>) -> Node>;

/// Named actions of an app.
pub struct ActionTree<S> {
    actions: BTreeMap<String, Action<S>>,
}

impl<S> Default for ActionTree<S> {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }
}

impl<S> fmt::Debug for ActionTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

impl<S> ActionTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action that ignores dispatched data.
    pub fn with<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut S) + 'static,
    {
        self.with_data(name, move |state: &mut S, _: &[String]| action(state))
    }

    /// Adds an action that receives the dispatched data, e.g. an input's value.
    pub fn with_data<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut S, &[String]) + 'static,
    {
        self.actions.insert(name.into(), Rc::new(action));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Action<S>> {
        self.actions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

/// Where the app mounts: a live handle or a selector resolved once at startup.
#[derive(Debug, Clone)]
pub enum Root<H> {
    Handle(H),
    Selector(String),
}

/// Render bookkeeping of one controller.
///
/// - `next_tree` is written by dispatch (and at startup)
/// - `render_pending` is set by a render request and cleared by the flush
/// - `previous_tree` is written only by the flush
#[derive(Debug, Default)]
pub struct RenderState {
    pub previous_tree: Option<Node>,
    pub next_tree: Option<Node>,
    pub render_pending: bool,
}

/// Startup parameters of an [`App`].
pub struct AppParams<S, D: Document> {
    pub root: Root<D::Handle>,
    pub state: S,
    pub actions: ActionTree<S>,
    pub view: View<S, D>,
}

struct AppInner<S, D: Document> {
    root: D::Handle,
    state: RefCell<S>,
    actions: ActionTree<S>,
    view: View<S, D>,
    render: RefCell<RenderState>,
    reconciler: Reconciler<D>,
    queue: Rc<TaskQueue>,
    flushes: Cell<usize>,
}

/// Handle passed to views for wiring events to actions.
///
/// Holds a weak reference, so trees kept alive by the document do not keep
/// the controller alive.
pub struct Dispatcher<S, D: Document> {
    inner: Weak<AppInner<S, D>>,
}

impl<S, D: Document> Clone for Dispatcher<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: 'static, D: Document + 'static> Dispatcher<S, D> {
    /// Runs `action` and requests a render.
    pub fn dispatch(&self, action: &str) -> ApplicationResult<()> {
        self.dispatch_with(action, &[])
    }

    /// Runs `action` with `data` and requests a render.
    pub fn dispatch_with(&self, action: &str, data: &[String]) -> ApplicationResult<()> {
        let inner = self
            .inner
            .upgrade()
            .ok_or(ApplicationError::ControllerDropped)?;
        AppInner::dispatch(&inner, action, data)
    }

    /// Listener that dispatches `action`; failures are logged.
    ///
    /// The target's value, when the event carries one, is passed as the only data item.
    pub fn handler(&self, action: &str) -> EventHandler {
        let dispatcher = self.clone();
        let action = action.to_string();
        Rc::new(move |event: &Event| {
            trace!(event = event.name.as_str(), action = action.as_str(), "event");
            let data: Vec<String> = event.value.iter().cloned().collect();
            if let Err(e) = dispatcher.dispatch_with(&action, &data) {
                error!("dispatch {} failed: {}", action, e);
            }
        })
    }
}

impl<S: 'static, D: Document + 'static> AppInner<S, D> {
    fn dispatch(this: &Rc<Self>, action: &str, data: &[String]) -> ApplicationResult<()> {
        let run = this
            .actions
            .get(action)
            .cloned()
            .ok_or_else(|| ApplicationError::UnknownAction(action.to_string()))?;
        debug!(action, ?data, "dispatch");
        run(&mut *this.state.borrow_mut(), data);
        Self::resolve_node(this);
        Ok(())
    }

    /// Computes the next tree from the current state and requests a render.
    fn resolve_node(this: &Rc<Self>) {
        let dispatcher = Dispatcher {
            inner: Rc::downgrade(this),
        };
        let next = {
            let state = this.state.borrow();
            (this.view)(&*state, &dispatcher)
        };
        this.render.borrow_mut().next_tree = Some(next);
        Self::schedule_render(this);
    }

    /// Returns false when a render was already pending.
    fn schedule_render(this: &Rc<Self>) -> bool {
        {
            let mut render = this.render.borrow_mut();
            if render.render_pending {
                trace!("render already pending");
                return false;
            }
            render.render_pending = true;
        }
        let weak = Rc::downgrade(this);
        this.queue.defer(move || match weak.upgrade() {
            Some(app) => app.flush().map(|_| ()),
            None => {
                debug!("controller dropped before render");
                Ok(())
            }
        });
        true
    }

    /// Patches the document from `previous_tree` to `next_tree`.
    ///
    /// The pending flag is cleared whether or not the patch succeeds, so the
    /// next dispatch schedules a fresh render. A failed patch keeps both trees:
    /// the retry diffs against the last tree that rendered completely, even
    /// though the live document may have been partially patched.
    #[instrument(level = "debug", skip(self))]
    fn flush(&self) -> ApplicationResult<bool> {
        let outcome = {
            let render = self.render.borrow();
            if !render.render_pending {
                return Ok(false);
            }
            match render.next_tree.as_ref() {
                Some(next) => self
                    .reconciler
                    .render(&self.root, render.previous_tree.as_ref(), next),
                None => Ok(()),
            }
        };
        let mut render = self.render.borrow_mut();
        render.render_pending = false;
        if let Err(e) = outcome {
            warn!("render failed: {}", e);
            return Err(e.into());
        }
        if let Some(next) = render.next_tree.take() {
            render.previous_tree = Some(next);
        }
        self.flushes.set(self.flushes.get() + 1);
        Ok(true)
    }
}

/// A mounted app.
pub struct App<S, D: Document> {
    inner: Rc<AppInner<S, D>>,
}

impl<S: 'static, D: Document + 'static> App<S, D> {
    /// Resolves the root, computes the first tree and schedules the first render.
    ///
    /// Fails with [`ApplicationError::RootNotFound`] when a selector matches nothing.
    #[instrument(level = "debug", skip_all)]
    pub fn new(doc: Rc<D>, queue: Rc<TaskQueue>, params: AppParams<S, D>) -> ApplicationResult<Self> {
        let root = match params.root {
            Root::Handle(handle) => handle,
            Root::Selector(selector) => doc
                .query_selector(&selector)?
                .ok_or(ApplicationError::RootNotFound(selector))?,
        };
        debug!(?root, actions = ?params.actions, "mounting app");

        let inner = Rc::new(AppInner {
            root,
            state: RefCell::new(params.state),
            actions: params.actions,
            view: params.view,
            render: RefCell::new(RenderState::default()),
            reconciler: Reconciler::new(doc),
            queue,
            flushes: Cell::new(0),
        });
        AppInner::resolve_node(&inner);
        Ok(Self { inner })
    }

    pub fn dispatch(&self, action: &str) -> ApplicationResult<()> {
        AppInner::dispatch(&self.inner, action, &[])
    }

    pub fn dispatch_with(&self, action: &str, data: &[String]) -> ApplicationResult<()> {
        AppInner::dispatch(&self.inner, action, data)
    }

    pub fn dispatcher(&self) -> Dispatcher<S, D> {
        Dispatcher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Runs the pending render now; returns false if none was pending.
    pub fn flush(&self) -> ApplicationResult<bool> {
        self.inner.flush()
    }

    pub fn state(&self) -> Ref<'_, S> {
        self.inner.state.borrow()
    }

    pub fn render_state(&self) -> Ref<'_, RenderState> {
        self.inner.render.borrow()
    }

    pub fn root(&self) -> &D::Handle {
        &self.inner.root
    }

    /// Number of renders that patched the document.
    pub fn flush_count(&self) -> usize {
        self.inner.flushes.get()
    }
}
