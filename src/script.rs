//! Scripted panel sessions.
//!
//! A script is a list of steps, each either a raw publish or a user action
//! on one of the coordinators. [`Panels`] wires a bus to all three
//! coordinators, runs scripts against them and records every envelope that
//! went over the bus.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bus::{EventBus, EventEnvelope, SubscriptionHandle};
use crate::config::Config;
use crate::coordinators::{
    BreadcrumbCoordinator, BreadcrumbView, ConfirmationCoordinator, ConfirmationView,
    DrawerCoordinator, DrawerView,
};
use crate::events;

/// User interaction with a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PanelAction {
    ClickBreadcrumb { index: usize },
    Confirm,
    Cancel,
    ToggleDrawer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Action(PanelAction),
    Publish {
        scope: String,
        event: String,
        #[serde(default)]
        payload: Value,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Load a script from a `.toml` file or, for any other extension, JSON.
    /// JSON scripts may be a bare array of steps.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&contents).context("Failed to parse TOML script")
        } else {
            Self::from_json(&contents)
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(contents).context("Failed to parse JSON script")?;
        if value.is_array() {
            let steps = serde_json::from_value(value).context("Invalid script steps")?;
            Ok(Self { steps })
        } else {
            serde_json::from_value(value).context("Invalid script")
        }
    }

    /// The built-in session used by `switchboard demo`
    pub fn demo(config: &Config) -> Self {
        let scopes = &config.scopes;
        let publish = |scope: &str, event: &str, payload: Value| ScriptStep::Publish {
            scope: scope.to_string(),
            event: event.to_string(),
            payload,
        };

        Self {
            steps: vec![
                publish(
                    &scopes.breadcrumb,
                    events::UPDATE_BREADCRUMB,
                    json!({"items": [
                        {"label": "Home", "target": "ROOT"},
                        {"label": "Rules", "target": "TAB_RULES", "tabIndex": 2},
                        {"label": "Rule A", "target": "TAB_RULE_A", "active": true}
                    ]}),
                ),
                publish(
                    &scopes.drawer,
                    events::OPEN_USAGE_IMPACT_DRAWER,
                    json!({"fullData": {"item": "Rule A", "usedBy": ["Mapping 1", "Model 4"]}}),
                ),
                publish(
                    &scopes.confirmation,
                    events::OPEN_CONFIRMATION_MODAL,
                    json!({"message": "Delete Rule A?", "command": "delete", "itemName": "Rule A"}),
                ),
                ScriptStep::Action(PanelAction::Confirm),
                ScriptStep::Action(PanelAction::ToggleDrawer),
                ScriptStep::Action(PanelAction::ClickBreadcrumb { index: 1 }),
            ],
        }
    }
}

/// Coordinator views at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelsSnapshot {
    pub breadcrumb: BreadcrumbView,
    pub confirmation: ConfirmationView,
    pub drawer: DrawerView,
}

/// An envelope as it was published, with its scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub scope: String,
    #[serde(flatten)]
    pub envelope: EventEnvelope,
}

type Transcript = Arc<Mutex<Vec<TranscriptEntry>>>;

/// A bus with all three coordinators attached
pub struct Panels {
    pub bus: Arc<EventBus>,
    pub breadcrumb: BreadcrumbCoordinator,
    pub confirmation: ConfirmationCoordinator,
    pub drawer: DrawerCoordinator,
    transcript: Transcript,
    taps: Vec<SubscriptionHandle>,
}

impl Panels {
    pub fn new(config: &Config) -> Self {
        let bus = Arc::new(EventBus::new(&config.bus));
        let transcript = Transcript::default();

        // Taps go first so entries are recorded in publish order
        let scopes: BTreeSet<&String> = [
            &config.scopes.breadcrumb,
            &config.scopes.navigation,
            &config.scopes.confirmation,
            &config.scopes.drawer,
        ]
        .into_iter()
        .collect();
        let taps = scopes
            .into_iter()
            .map(|scope| {
                let sink = Arc::clone(&transcript);
                let name = scope.clone();
                bus.subscribe(scope, move |envelope| {
                    sink.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(TranscriptEntry {
                            scope: name.clone(),
                            envelope: envelope.clone(),
                        });
                })
            })
            .collect();

        Self {
            breadcrumb: BreadcrumbCoordinator::new(&bus, config),
            confirmation: ConfirmationCoordinator::new(&bus, config),
            drawer: DrawerCoordinator::new(&bus, config),
            bus,
            transcript,
            taps,
        }
    }

    pub fn run_step(&self, step: &ScriptStep) -> Result<()> {
        match step {
            ScriptStep::Publish {
                scope,
                event,
                payload,
            } => self.bus.publish(scope, event.as_str(), payload.clone())?,
            ScriptStep::Action(PanelAction::ClickBreadcrumb { index }) => {
                self.breadcrumb.click(*index)?;
            }
            ScriptStep::Action(PanelAction::Confirm) => self.confirmation.confirm()?,
            ScriptStep::Action(PanelAction::Cancel) => self.confirmation.cancel(),
            ScriptStep::Action(PanelAction::ToggleDrawer) => self.drawer.toggle()?,
        }
        Ok(())
    }

    pub fn run(&self, script: &Script) -> Result<()> {
        for (n, step) in script.steps.iter().enumerate() {
            self.run_step(step)
                .with_context(|| format!("Script step {} failed", n + 1))?;
        }
        Ok(())
    }

    /// Everything published so far, in order
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the transcript
    pub fn take_transcript(&self) -> Vec<TranscriptEntry> {
        std::mem::take(
            &mut *self
                .transcript
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn snapshot(&self) -> PanelsSnapshot {
        PanelsSnapshot {
            breadcrumb: self.breadcrumb.view(),
            confirmation: self.confirmation.view(),
            drawer: self.drawer.view(),
        }
    }
}

impl Drop for Panels {
    fn drop(&mut self) {
        for tap in &self.taps {
            self.bus.unsubscribe(tap);
        }
    }
}
