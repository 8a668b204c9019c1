//! Subscriber registry with panic-isolated event fan-out.

use crate::model::ProcessEvent;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Callback invoked for every published process event.
pub type EventHandler = std::sync::Arc<dyn Fn(&ProcessEvent) + Send + Sync>;

/// Registration-ordered list of event handlers.
///
/// `publish` copies the handler list under a short-held lock, releases it,
/// then invokes each handler. Handlers therefore run with no engine lock
/// held and may call back into the instance's read accessors. Each
/// invocation has its own panic barrier: one faulting handler never
/// suppresses later ones and never corrupts the run.
#[derive(Default)]
pub(crate) struct SubscriberSet {
    handlers: Mutex<Vec<EventHandler>>,
}

impl SubscriberSet {
    /// Append a handler. Handlers are invoked in registration order.
    pub fn subscribe(&self, handler: EventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Deliver one event to every registered handler.
    pub fn publish(&self, event: &ProcessEvent) {
        let snapshot: Vec<EventHandler> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(
                    process = %event.process_id,
                    kind = ?event.kind,
                    "event handler panicked; continuing with remaining handlers"
                );
            }
        }
    }
}
