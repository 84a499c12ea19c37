//! The routed message stored as a scope's current value.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// One published message: an event name plus its structured payload.
///
/// Envelopes are immutable once published. A later publish on the same
/// scope replaces the stored envelope; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct EventEnvelope {
    /// Event name, e.g. `open_confirmation_modal`
    pub event: String,

    /// Event payload; `null` when the event carries none
    #[serde(default)]
    #[ts(type = "unknown")]
    pub payload: Value,
}

impl EventEnvelope {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

impl std::fmt::Display for EventEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.payload.is_null() {
            write!(f, "{}", self.event)
        } else {
            write!(f, "{} {}", self.event, self.payload)
        }
    }
}
