//! Switchboard - cross-panel coordination for single-page applications
//!
//! Panels talk to each other only through an [`bus::EventBus`]: a set of
//! named scopes, each holding the last envelope published on it. Panel
//! coordinators translate bus events into local view state, and the
//! [`steps::StepSequencer`] tracks progress through an ordered workflow.

pub mod bus;
pub mod config;
pub mod coordinators;
pub mod events;
pub mod logging;
pub mod script;
pub mod steps;

pub use bus::{BusError, EventBus, EventEnvelope, SubscriptionHandle};
pub use config::Config;
pub use events::PanelEvent;
