//! Panel coordinators.
//!
//! A coordinator owns one panel's visible state. It subscribes to a single
//! scope when built, decodes every notification into a [`PanelEvent`],
//! applies the ones it understands and ignores the rest. Handlers may queue
//! follow-up events; those are published after the panel state lock has
//! been released, so a follow-up that loops back to the same coordinator
//! cannot deadlock.

mod breadcrumb;
mod confirmation;
mod drawer;

pub use breadcrumb::{BreadcrumbCoordinator, BreadcrumbView, ROOT_TARGET, TAB_PREFIX};
pub use confirmation::{ConfirmationCoordinator, ConfirmationView};
pub use drawer::{DrawerCoordinator, DrawerView};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::bus::{BusError, EventBus, SubscriptionHandle};
use crate::events::PanelEvent;

/// Events a handler wants published once it returns
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<(String, PanelEvent)>,
}

impl Outbox {
    pub fn push(&mut self, scope: &str, event: PanelEvent) {
        self.messages.push((scope.to_string(), event));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Publish queued events in order, stopping at the first failure
    pub fn flush(self, bus: &EventBus) -> Result<(), BusError> {
        for (scope, event) in self.messages {
            bus.publish_event(&scope, &event)?;
        }
        Ok(())
    }
}

/// Shared, lockable panel state
pub(crate) type SharedView<V> = Arc<Mutex<V>>;

pub(crate) fn lock<V>(view: &Mutex<V>) -> MutexGuard<'_, V> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A coordinator's registration on the bus; unsubscribes when dropped.
pub struct PanelSubscription {
    bus: Weak<EventBus>,
    handle: SubscriptionHandle,
}

impl PanelSubscription {
    /// Subscribe `handler` to `scope`, routing decoded events into `view`.
    pub(crate) fn attach<V, H>(
        bus: &Arc<EventBus>,
        scope: &str,
        panel: &'static str,
        view: &SharedView<V>,
        handler: H,
    ) -> Self
    where
        V: Send + 'static,
        H: Fn(&mut V, PanelEvent, &mut Outbox) + Send + Sync + 'static,
    {
        // Weak, so the bus does not keep itself alive through its listeners
        let weak_bus = Arc::downgrade(bus);
        let view = Arc::clone(view);

        let handle = bus.subscribe(scope, move |envelope| {
            let Some(event) = PanelEvent::decode(envelope) else {
                tracing::trace!(panel, event = %envelope.event, "Ignoring unknown event");
                return;
            };

            let mut outbox = Outbox::default();
            {
                let mut state = lock(&view);
                handler(&mut state, event, &mut outbox);
            }

            if outbox.is_empty() {
                return;
            }
            let Some(bus) = weak_bus.upgrade() else {
                return;
            };
            if let Err(e) = outbox.flush(&bus) {
                tracing::warn!(panel, error = %e, "Follow-up publish failed");
            }
        });

        Self {
            bus: Arc::downgrade(bus),
            handle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Stop receiving events. Safe to call more than once.
    pub fn release(&self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(&self.handle);
        }
    }
}

impl Drop for PanelSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
