//! Application layer: reconciliation and the app controller
//!
//! This layer drives the host document through the `Document` boundary trait.

pub mod controller;
pub mod counter;
pub mod error;
pub mod reconciler;
pub mod scheduler;

pub use controller::{Action, ActionTree, App, AppParams, Dispatcher, RenderState, Root, View};
pub use error::{ApplicationError, ApplicationResult};
pub use reconciler::Reconciler;
pub use scheduler::TaskQueue;
