//! rsdom: a minimal virtual tree UI library
//!
//! Views describe the UI as a tree of plain values ([`domain::Node`]). The
//! [`application::Reconciler`] compares the previous and the next tree and
//! patches a live host document through the [`infrastructure::Document`] trait.
//! An [`application::App`] ties state, named actions and a view together and
//! coalesces render requests onto a [`application::TaskQueue`].
//!
//! Layers:
//! - `domain`: tree model and change classification, no host access
//! - `application`: reconciler, scheduler and app controller
//! - `infrastructure`: host documents (in-memory, and browser behind the `web` feature)
//! - `cli`: the `rsdom` binary

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{App, ApplicationError, Reconciler, TaskQueue};
pub use domain::{h, Element, Node};
pub use infrastructure::{Document, DocumentError, MemoryDocument};
