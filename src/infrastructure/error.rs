//! Host document errors

use thiserror::Error;

/// Errors raised by a host document implementation.
///
/// The reconciler never translates these; they reach the caller unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("node handle no longer refers to a live node")]
    StaleHandle,

    #[error("operation requires an element node")]
    NotAnElement,

    #[error("no child at index {index}")]
    ChildNotFound { index: usize },

    #[error("node is not a child of the given parent")]
    NotAChild,

    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),

    #[error("host document error: {0}")]
    Host(String),
}

/// Result type for host document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
