//! Ordered set of observers notified of every inbound protocol line.
//!
//! The [`HandlerRegistry`] lives independently of any connection so handlers
//! can be registered before connecting and survive reconnects. Handlers are
//! identified by `Arc` pointer identity: registering the same `Arc` twice is
//! rejected, while two separately allocated handlers with identical
//! behaviour are distinct.

mod errors;

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error};

pub use self::errors::RegistryError;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Observer of inbound protocol lines.
///
/// Implementations must tolerate any line, return promptly when a line is of
/// no interest, and avoid panicking for control flow. A handler may call
/// back into the client to send replies.
pub trait MessageHandler: Send + Sync {
    /// Receives one line with its CRLF terminator removed.
    fn handle(&self, line: &str);
}

impl<F> MessageHandler for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn handle(&self, line: &str) {
        self(line);
    }
}

/// Shared handle to a registered observer.
pub type SharedHandler = Arc<dyn MessageHandler>;

/// Thread-safe, ordered collection of [`MessageHandler`]s.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<Vec<SharedHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` so it observes subsequent dispatches.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] when the same handler is
    /// already registered, or [`RegistryError::MutationDuringDispatch`] when
    /// called from inside a handler.
    pub fn register(&self, handler: SharedHandler) -> Result<(), RegistryError> {
        let mut handlers = self.lock_for_mutation()?;
        if handlers.iter().any(|existing| same_handler(existing, &handler)) {
            return Err(RegistryError::DuplicateHandler);
        }
        handlers.push(handler);
        debug!(
            target: REGISTRY_TARGET,
            handlers = handlers.len(),
            "registered message handler"
        );
        Ok(())
    }

    /// Removes `handler` from every dispatch that starts afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandler`] when the handler is not
    /// registered, or [`RegistryError::MutationDuringDispatch`] when called
    /// from inside a handler.
    pub fn unregister(&self, handler: &SharedHandler) -> Result<(), RegistryError> {
        let mut handlers = self.lock_for_mutation()?;
        let position = handlers
            .iter()
            .position(|existing| same_handler(existing, handler))
            .ok_or(RegistryError::UnknownHandler)?;
        handlers.remove(position);
        debug!(
            target: REGISTRY_TARGET,
            handlers = handlers.len(),
            "unregistered message handler"
        );
        Ok(())
    }

    /// Invokes every registered handler with `line`, in registration order.
    ///
    /// Handlers run against a snapshot taken when the call starts, with the
    /// registry unlocked, so they may query it. A panicking handler is logged
    /// and skipped; the remaining handlers still run and the registry stays
    /// usable.
    pub fn dispatch(&self, line: &str) {
        let handlers = self.snapshot();
        let _dispatching = DispatchGuard::enter();
        for (index, handler) in handlers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(line)));
            if let Err(payload) = outcome {
                error!(
                    target: REGISTRY_TARGET,
                    handler = index,
                    panic = panic_message(&*payload),
                    "message handler panicked"
                );
            }
        }
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn snapshot(&self) -> Vec<SharedHandler> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SharedHandler>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_for_mutation(&self) -> Result<MutexGuard<'_, Vec<SharedHandler>>, RegistryError> {
        if DISPATCHING.with(Cell::get) {
            return Err(RegistryError::MutationDuringDispatch);
        }
        Ok(self.lock())
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.try_lock().ok().map(|handlers| handlers.len());
        formatter
            .debug_struct("HandlerRegistry")
            .field("handlers", &handlers)
            .finish()
    }
}

fn same_handler(left: &SharedHandler, right: &SharedHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Marks the current thread as dispatching until dropped.
struct DispatchGuard {
    previous: bool,
}

impl DispatchGuard {
    fn enter() -> Self {
        Self {
            previous: DISPATCHING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(self.previous));
    }
}
