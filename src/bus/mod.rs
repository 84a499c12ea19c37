//! Scope-partitioned, last-value-wins publish/subscribe bus.
//!
//! Each scope holds at most one [`EventEnvelope`], the most recent one
//! published on it. Publishing stores the envelope and synchronously calls
//! every listener registered on that scope, in registration order, before
//! returning. A publish made from inside a listener runs its whole fan-out
//! before the outer publish moves on to its next listener (depth-first).
//!
//! Subscribing to a scope that already holds a value replays that value to
//! the new listener immediately, then delivers every later publish.

mod envelope;
mod error;
mod gate;

pub use envelope::EventEnvelope;
pub use error::BusError;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::config::BusConfig;
use crate::events::PanelEvent;
use gate::DispatchGate;

/// Callback invoked with a scope's new state
pub type Listener = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

/// Identifies one registration on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SubscriptionId(u64);

/// Returned by [`EventBus::subscribe`]; pass it to
/// [`EventBus::unsubscribe`] to stop delivery.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    scope: String,
    active: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    /// False once the handle has been unsubscribed
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

struct Subscriber {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct ScopeSlot {
    state: Option<Arc<EventEnvelope>>,
    subscribers: Vec<Subscriber>,
}

pub struct EventBus {
    slots: Mutex<HashMap<String, ScopeSlot>>,
    gate: DispatchGate,
    next_id: AtomicU64,
    max_depth: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}

impl EventBus {
    pub fn new(config: &BusConfig) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            gate: DispatchGate::default(),
            next_id: AtomicU64::new(1),
            max_depth: config.max_publish_depth,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, ScopeSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `event`/`payload` as the new state of `scope` and notify every
    /// listener of that scope before returning.
    ///
    /// Fails only when the publish would nest deeper than
    /// `bus.max_publish_depth`; the envelope is then not stored.
    pub fn publish(
        &self,
        scope: &str,
        event: impl Into<String>,
        payload: Value,
    ) -> Result<(), BusError> {
        let envelope = Arc::new(EventEnvelope::new(event, payload));

        let round = self.gate.enter_bounded(self.max_depth).map_err(|depth| {
            tracing::error!(
                scope,
                event = %envelope.event,
                depth,
                "Publish depth limit reached, dropping event"
            );
            BusError::DepthExceeded {
                scope: scope.to_string(),
                event: envelope.event.clone(),
                depth,
                limit: self.max_depth,
            }
        })?;

        let listeners = {
            let mut slots = self.slots();
            let slot = slots.entry(scope.to_string()).or_default();
            slot.state = Some(Arc::clone(&envelope));
            snapshot(slot)
        };

        tracing::trace!(
            scope,
            event = %envelope.event,
            depth = round.depth(),
            listeners = listeners.len(),
            "Publishing"
        );

        deliver(&listeners, &envelope);
        Ok(())
    }

    /// Publish a typed event
    pub fn publish_event(&self, scope: &str, event: &PanelEvent) -> Result<(), BusError> {
        self.publish(scope, event.name(), event.payload())
    }

    /// Register `listener` on `scope`.
    ///
    /// If the scope already holds a value the listener is called with it
    /// before this returns.
    pub fn subscribe<F>(&self, scope: &str, listener: F) -> SubscriptionHandle
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let active = Arc::new(AtomicBool::new(true));
        let listener: Listener = Arc::new(listener);

        let _round = self.gate.enter();

        let cached = {
            let mut slots = self.slots();
            let slot = slots.entry(scope.to_string()).or_default();
            slot.subscribers.push(Subscriber {
                id,
                active: Arc::clone(&active),
                listener: Arc::clone(&listener),
            });
            slot.state.clone()
        };

        tracing::debug!(scope, id = id.0, replay = cached.is_some(), "Subscribed");

        if let Some(envelope) = cached {
            if active.load(Ordering::Acquire) {
                listener(&envelope);
            }
        }

        SubscriptionHandle {
            id,
            scope: scope.to_string(),
            active,
        }
    }

    /// Stop delivery to the listener behind `handle`. Idempotent.
    ///
    /// Once this returns the listener will not be called again. A round in
    /// progress on another thread is waited out; when called from inside a
    /// listener, the remaining listeners of the current round skip it.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let was_active = handle.active.swap(false, Ordering::AcqRel);

        let _round = self.gate.enter();

        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(&handle.scope) {
            slot.subscribers.retain(|s| s.id != handle.id);
        }

        if was_active {
            tracing::debug!(scope = %handle.scope, id = handle.id.0, "Unsubscribed");
        }
    }

    /// Current state of `scope`, if anything was published on it
    pub fn peek(&self, scope: &str) -> Option<EventEnvelope> {
        self.slots()
            .get(scope)
            .and_then(|slot| slot.state.as_deref().cloned())
    }

    /// Number of live subscriptions on `scope`
    pub fn subscriber_count(&self, scope: &str) -> usize {
        self.slots()
            .get(scope)
            .map(|slot| slot.subscribers.len())
            .unwrap_or(0)
    }

    /// Names of all scopes that have been published or subscribed to
    pub fn scopes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots().keys().cloned().collect();
        names.sort();
        names
    }

    /// Clear every scope's stored value. Subscriptions are kept.
    pub fn reset(&self) {
        let _round = self.gate.enter();
        for slot in self.slots().values_mut() {
            slot.state = None;
        }
        tracing::debug!("Bus state reset");
    }
}

fn snapshot(slot: &ScopeSlot) -> Vec<(Arc<AtomicBool>, Listener)> {
    slot.subscribers
        .iter()
        .map(|s| (Arc::clone(&s.active), Arc::clone(&s.listener)))
        .collect()
}

fn deliver(listeners: &[(Arc<AtomicBool>, Listener)], envelope: &EventEnvelope) {
    for (active, listener) in listeners {
        // Re-checked per listener: an earlier listener may have unsubscribed it
        if active.load(Ordering::Acquire) {
            listener(envelope);
        }
    }
}
