//! Application-level errors (wraps host document errors)

use thiserror::Error;

use crate::infrastructure::DocumentError;

/// Application errors wrap document errors and add rendering/controller context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("root element not found: {0}")]
    RootNotFound(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("controller is no longer alive")]
    ControllerDropped,

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
