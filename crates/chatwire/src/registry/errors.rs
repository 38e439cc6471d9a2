//! Error types for handler registration.

use thiserror::Error;

/// Errors raised when mutating a [`super::HandlerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handler is already registered.
    #[error("message handler is already registered")]
    DuplicateHandler,
    /// The handler was never registered or has already been removed.
    #[error("message handler is not registered")]
    UnknownHandler,
    /// A handler attempted to change the registry while it was dispatching.
    #[error("message handlers cannot be changed from inside a dispatch")]
    MutationDuringDispatch,
}
