use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{lock, Outbox, PanelSubscription, SharedView};
use crate::bus::{BusError, EventBus};
use crate::config::Config;
use crate::events::{
    ConfirmationCommand, ConfirmationOutcome, ConfirmationRequest, PanelEvent, DEFAULT_THEME,
};

/// What the confirmation modal currently shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConfirmationView {
    pub is_visible: bool,
    pub title: String,
    pub message: String,
    pub command: ConfirmationCommand,
    pub item_name: String,
    pub theme: String,
}

impl Default for ConfirmationView {
    fn default() -> Self {
        Self {
            is_visible: false,
            title: String::new(),
            message: String::new(),
            command: ConfirmationCommand::default(),
            item_name: String::new(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl ConfirmationView {
    fn open(request: ConfirmationRequest) -> Self {
        Self {
            is_visible: true,
            title: request.resolved_title(),
            message: request.message,
            command: request.command,
            item_name: request.item_name,
            theme: request.theme,
        }
    }
}

/// Modal that asks the user to approve an action on behalf of another panel.
///
/// It never performs the action: confirming publishes
/// `confirmation_<command>_confirmed` and the requester reacts to that.
pub struct ConfirmationCoordinator {
    bus: Arc<EventBus>,
    scope: String,
    view: SharedView<ConfirmationView>,
    subscription: PanelSubscription,
}

impl ConfirmationCoordinator {
    pub fn new(bus: &Arc<EventBus>, config: &Config) -> Self {
        let view: SharedView<ConfirmationView> = Arc::default();
        let subscription = PanelSubscription::attach(
            bus,
            &config.scopes.confirmation,
            "confirmation",
            &view,
            |state: &mut ConfirmationView, event, _outbox| match event {
                PanelEvent::OpenConfirmationModal(request) => {
                    tracing::debug!(
                        command = %request.command,
                        item = %request.item_name,
                        "Opening confirmation"
                    );
                    *state = ConfirmationView::open(request);
                }
                // Our own confirmed events come back on this scope
                PanelEvent::ConfirmationConfirmed(_)
                | PanelEvent::OpenUsageImpactDrawer(_)
                | PanelEvent::CloseUsageImpactDrawer
                | PanelEvent::UpdateBreadcrumb(_)
                | PanelEvent::BreadcrumbNavigate(_)
                | PanelEvent::CloseEditMapping
                | PanelEvent::CloseEditModel
                | PanelEvent::CloseEditRule
                | PanelEvent::CloseEditCodeset => {}
            },
        );

        Self {
            bus: Arc::clone(bus),
            scope: config.scopes.confirmation.clone(),
            view,
            subscription,
        }
    }

    pub fn view(&self) -> ConfirmationView {
        lock(&self.view).clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.view).is_visible
    }

    /// Approve the pending request. Does nothing while hidden.
    pub fn confirm(&self) -> Result<(), BusError> {
        let outcome = {
            let mut view = lock(&self.view);
            if !view.is_visible {
                return Ok(());
            }
            // Hidden before the reply goes out so the requester may reopen
            // the modal from its handler
            view.is_visible = false;
            ConfirmationOutcome {
                item_name: view.item_name.clone(),
                confirmed: true,
                command: view.command,
            }
        };

        tracing::info!(command = %outcome.command, item = %outcome.item_name, "Confirmed");
        let mut outbox = Outbox::default();
        outbox.push(&self.scope, PanelEvent::ConfirmationConfirmed(outcome));
        outbox.flush(&self.bus)
    }

    /// Dismiss without publishing anything
    pub fn cancel(&self) {
        let mut view = lock(&self.view);
        if view.is_visible {
            tracing::debug!(command = %view.command, "Confirmation cancelled");
        }
        view.is_visible = false;
    }

    pub fn subscription(&self) -> &PanelSubscription {
        &self.subscription
    }

    pub fn teardown(&self) {
        self.subscription.release();
    }
}
