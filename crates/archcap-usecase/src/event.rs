//! Post-commit event dispatch
//!
//! Once a batch of events is persisted, every registered handler sees it,
//! synchronously and in registration order. Projections register first so
//! that cascades dispatched afterwards read an up-to-date tree.
//!
//! A failing handler never fails the save that triggered it: the events
//! are already committed. The failure is logged and the next handler runs.

use std::sync::{Arc, PoisonError, RwLock};

use archcap_domain::CapabilityEvent;
use tracing::{debug, warn};

use crate::error::Result;

pub trait EventHandler: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    fn handle(&self, event: &CapabilityEvent) -> Result<()>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver committed events, returning how many deliveries failed
    pub fn dispatch(&self, events: &[CapabilityEvent]) -> usize {
        // Snapshot so handlers may dispatch commands that save again.
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut failures = 0;
        for event in events {
            for handler in &handlers {
                debug!(
                    handler = handler.name(),
                    event = event.event_type(),
                    capability_id = %event.capability_id(),
                    "Dispatching event"
                );
                if let Err(error) = handler.handle(event) {
                    failures += 1;
                    warn!(
                        handler = handler.name(),
                        event = event.event_type(),
                        capability_id = %event.capability_id(),
                        error = %error,
                        "Event handler failed"
                    );
                }
            }
        }
        failures
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UseCaseError;
    use archcap_domain::CapabilityId;
    use chrono::Utc;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl EventHandler for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, _event: &CapabilityEvent) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(UseCaseError::CapabilityNotFound(CapabilityId::new("x")));
            }
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_in_registration_order_despite_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::new();
        for (name, fail) in [("projection", false), ("cascade", true), ("audit", false)] {
            dispatcher.register(Arc::new(Recorder {
                name,
                log: log.clone(),
                fail,
            }));
        }

        let event = CapabilityEvent::CapabilityDeleted {
            capability_id: CapabilityId::new("x"),
            deleted_at: Utc::now(),
        };
        let failures = dispatcher.dispatch(&[event]);

        assert_eq!(failures, 1);
        assert_eq!(*log.lock().unwrap(), ["projection", "cascade", "audit"]);
    }
}
