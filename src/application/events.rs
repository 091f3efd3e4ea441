//! Single-slot event handlers

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::domain::recording::{BlobEvent, ErrorEvent, Event};

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Holds at most one handler. Assigning replaces the previous one; an empty
/// slot behaves as a no-op.
pub struct HandlerSlot<E> {
    handler: Mutex<Option<Handler<E>>>,
}

impl<E> HandlerSlot<E> {
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }

    pub fn set<F>(&self, handler: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        *self.lock() = Some(Arc::new(handler));
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Invoke the current handler. The slot is not locked during the call, so
    /// a handler may replace itself or drive the recorder.
    ///
    /// A panicking handler is logged and contained. Builds with
    /// `panic = "abort"` still abort.
    pub fn dispatch(&self, event: &E) {
        let handler = self.lock().clone();
        if let Some(handler) = handler {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!("event handler panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Handler<E>>> {
        self.handler.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E> Default for HandlerSlot<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The recorder's `on*` handlers
#[derive(Default)]
pub struct EventHandlers {
    pub onstart: HandlerSlot<Event>,
    pub ondataavailable: HandlerSlot<BlobEvent>,
    pub onstop: HandlerSlot<Event>,
    pub onerror: HandlerSlot<ErrorEvent>,
}
