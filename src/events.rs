//! Closed vocabulary of panel events.
//!
//! Every event name a coordinator reacts to or emits is a variant of
//! [`PanelEvent`]. Envelopes with names outside this set decode to `None`
//! and are ignored. Payload fields are read leniently: missing or
//! mistyped fields fall back to their defaults instead of failing.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::bus::EventEnvelope;

pub const OPEN_CONFIRMATION_MODAL: &str = "open_confirmation_modal";
pub const OPEN_USAGE_IMPACT_DRAWER: &str = "open_usage_impact_drawer";
pub const CLOSE_USAGE_IMPACT_DRAWER: &str = "close_usage_impact_drawer";
pub const UPDATE_BREADCRUMB: &str = "update_breadcrumb";
pub const BREADCRUMB_NAVIGATE: &str = "breadcrumb_navigate";
pub const CLOSE_EDIT_MAPPING: &str = "close_edit_mapping";
pub const CLOSE_EDIT_MODEL: &str = "close_edit_model";
pub const CLOSE_EDIT_RULE: &str = "close_edit_rule";
pub const CLOSE_EDIT_CODESET: &str = "close_edit_codeset";

const CONFIRMED_PREFIX: &str = "confirmation_";
const CONFIRMED_SUFFIX: &str = "_confirmed";

/// Action a confirmation modal asks the user to approve
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ConfirmationCommand {
    Save,
    Delete,
    Reset,
    #[default]
    Confirm,
    Discard,
}

impl ConfirmationCommand {
    pub const ALL: [ConfirmationCommand; 5] = [
        Self::Save,
        Self::Delete,
        Self::Reset,
        Self::Confirm,
        Self::Discard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Reset => "reset",
            Self::Confirm => "confirm",
            Self::Discard => "discard",
        }
    }

    /// Title shown when the request does not supply one
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Delete => "Delete Confirmation",
            _ => "Confirm Action",
        }
    }

    /// Name of the event published when this command is confirmed
    pub fn confirmed_event(self) -> String {
        format!("{CONFIRMED_PREFIX}{}{CONFIRMED_SUFFIX}", self.as_str())
    }
}

impl fmt::Display for ConfirmationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown confirmation command '{s}'"))
    }
}

/// Payload of `open_confirmation_modal`, with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConfirmationRequest {
    pub message: String,
    pub command: ConfirmationCommand,
    pub item_name: String,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub const DEFAULT_THEME: &str = "dark";

impl Default for ConfirmationRequest {
    fn default() -> Self {
        Self {
            message: String::new(),
            command: ConfirmationCommand::default(),
            item_name: String::new(),
            theme: DEFAULT_THEME.to_string(),
            title: None,
        }
    }
}

impl ConfirmationRequest {
    /// Explicit title, or the command's default
    pub fn resolved_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.command.default_title().to_string())
    }

    fn from_payload(payload: &Value) -> Self {
        let raw: RawConfirmationRequest = lenient(payload);
        let command = raw
            .command
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default();
        Self {
            message: raw.message.unwrap_or_default(),
            command,
            item_name: raw.item_name.unwrap_or_default(),
            theme: raw.theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
            title: raw.title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawConfirmationRequest {
    message: Option<String>,
    command: Option<String>,
    item_name: Option<String>,
    theme: Option<String>,
    title: Option<String>,
}

/// Payload of `confirmation_<command>_confirmed`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConfirmationOutcome {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub command: ConfirmationCommand,
}

/// Payload of `open_usage_impact_drawer`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct DrawerContent {
    #[ts(type = "unknown")]
    pub full_data: Value,
}

/// One entry of the breadcrumb trail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct BreadcrumbItem {
    pub label: String,
    pub target: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<u32>,
}

/// Payload of `update_breadcrumb`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct BreadcrumbTrail {
    pub items: Vec<BreadcrumbItem>,
}

/// Payload of `breadcrumb_navigate`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct NavigationTarget {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<u32>,
}

/// Every event the coordinators understand
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    OpenConfirmationModal(ConfirmationRequest),
    ConfirmationConfirmed(ConfirmationOutcome),
    OpenUsageImpactDrawer(DrawerContent),
    CloseUsageImpactDrawer,
    UpdateBreadcrumb(BreadcrumbTrail),
    BreadcrumbNavigate(NavigationTarget),
    CloseEditMapping,
    CloseEditModel,
    CloseEditRule,
    CloseEditCodeset,
}

impl PanelEvent {
    /// The four close-edit events, in the order they are broadcast
    pub const CLOSE_EDITS: [PanelEvent; 4] = [
        PanelEvent::CloseEditMapping,
        PanelEvent::CloseEditModel,
        PanelEvent::CloseEditRule,
        PanelEvent::CloseEditCodeset,
    ];

    /// Wire name of the event
    pub fn name(&self) -> String {
        match self {
            Self::OpenConfirmationModal(_) => OPEN_CONFIRMATION_MODAL.to_string(),
            Self::ConfirmationConfirmed(outcome) => outcome.command.confirmed_event(),
            Self::OpenUsageImpactDrawer(_) => OPEN_USAGE_IMPACT_DRAWER.to_string(),
            Self::CloseUsageImpactDrawer => CLOSE_USAGE_IMPACT_DRAWER.to_string(),
            Self::UpdateBreadcrumb(_) => UPDATE_BREADCRUMB.to_string(),
            Self::BreadcrumbNavigate(_) => BREADCRUMB_NAVIGATE.to_string(),
            Self::CloseEditMapping => CLOSE_EDIT_MAPPING.to_string(),
            Self::CloseEditModel => CLOSE_EDIT_MODEL.to_string(),
            Self::CloseEditRule => CLOSE_EDIT_RULE.to_string(),
            Self::CloseEditCodeset => CLOSE_EDIT_CODESET.to_string(),
        }
    }

    /// Wire payload of the event; `null` for events without one
    pub fn payload(&self) -> Value {
        match self {
            Self::OpenConfirmationModal(request) => to_value(request),
            Self::ConfirmationConfirmed(outcome) => to_value(outcome),
            Self::OpenUsageImpactDrawer(content) => to_value(content),
            Self::UpdateBreadcrumb(trail) => to_value(trail),
            Self::BreadcrumbNavigate(target) => to_value(target),
            Self::CloseUsageImpactDrawer
            | Self::CloseEditMapping
            | Self::CloseEditModel
            | Self::CloseEditRule
            | Self::CloseEditCodeset => Value::Null,
        }
    }

    pub fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::new(self.name(), self.payload())
    }

    /// Decode an envelope; `None` when the name is not part of the vocabulary
    pub fn decode(envelope: &EventEnvelope) -> Option<Self> {
        let payload = &envelope.payload;
        let event = match envelope.event.as_str() {
            OPEN_CONFIRMATION_MODAL => {
                Self::OpenConfirmationModal(ConfirmationRequest::from_payload(payload))
            }
            OPEN_USAGE_IMPACT_DRAWER => Self::OpenUsageImpactDrawer(lenient(payload)),
            CLOSE_USAGE_IMPACT_DRAWER => Self::CloseUsageImpactDrawer,
            UPDATE_BREADCRUMB => Self::UpdateBreadcrumb(lenient(payload)),
            BREADCRUMB_NAVIGATE => Self::BreadcrumbNavigate(lenient(payload)),
            CLOSE_EDIT_MAPPING => Self::CloseEditMapping,
            CLOSE_EDIT_MODEL => Self::CloseEditModel,
            CLOSE_EDIT_RULE => Self::CloseEditRule,
            CLOSE_EDIT_CODESET => Self::CloseEditCodeset,
            other => {
                let command = confirmed_command(other)?;
                let mut outcome: ConfirmationOutcome = lenient(payload);
                // The event name is authoritative for which command was confirmed
                outcome.command = command;
                Self::ConfirmationConfirmed(outcome)
            }
        };
        Some(event)
    }
}

/// Parse `confirmation_<command>_confirmed`
fn confirmed_command(name: &str) -> Option<ConfirmationCommand> {
    name.strip_prefix(CONFIRMED_PREFIX)?
        .strip_suffix(CONFIRMED_SUFFIX)?
        .parse()
        .ok()
}

fn lenient<T: DeserializeOwned + Default>(payload: &Value) -> T {
    if payload.is_null() {
        return T::default();
    }
    serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Malformed event payload, using defaults");
        T::default()
    })
}

fn to_value<T: Serialize>(value: &T) -> Value {
    // Payload types are plain structs of strings, numbers and JSON values
    serde_json::to_value(value).unwrap_or(Value::Null)
}
