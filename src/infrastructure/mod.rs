//! Infrastructure layer: host document implementations
//!
//! This layer implements the host document boundary trait.

pub mod error;
pub mod memory;
pub mod traits;
#[cfg(feature = "web")]
pub mod web;

pub use error::{DocumentError, DocumentResult};
pub use memory::{MemoryDocument, Mutation, NodeId};
pub use traits::Document;
#[cfg(feature = "web")]
pub use web::WebDocument;
