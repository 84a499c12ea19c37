use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::{lock, Outbox, PanelSubscription, SharedView};
use crate::bus::{BusError, EventBus};
use crate::config::Config;
use crate::events::PanelEvent;

/// What the usage impact drawer currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrawerView {
    pub is_visible: bool,
    #[ts(type = "unknown")]
    pub full_data: Value,
}

/// Side drawer listing where an item is used.
///
/// Opened and closed only through bus events, so any panel can close it
/// without a reference to it.
pub struct DrawerCoordinator {
    bus: Arc<EventBus>,
    scope: String,
    view: SharedView<DrawerView>,
    subscription: PanelSubscription,
}

impl DrawerCoordinator {
    pub fn new(bus: &Arc<EventBus>, config: &Config) -> Self {
        let view: SharedView<DrawerView> = Arc::default();
        let subscription = PanelSubscription::attach(
            bus,
            &config.scopes.drawer,
            "drawer",
            &view,
            |state: &mut DrawerView, event, _outbox| match event {
                PanelEvent::OpenUsageImpactDrawer(content) => {
                    tracing::debug!("Opening usage impact drawer");
                    state.full_data = content.full_data;
                    state.is_visible = true;
                }
                PanelEvent::CloseUsageImpactDrawer => {
                    tracing::debug!("Closing usage impact drawer");
                    state.is_visible = false;
                }
                PanelEvent::OpenConfirmationModal(_)
                | PanelEvent::ConfirmationConfirmed(_)
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
            scope: config.scopes.drawer.clone(),
            view,
            subscription,
        }
    }

    pub fn view(&self) -> DrawerView {
        lock(&self.view).clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.view).is_visible
    }

    /// The drawer's own close control. Publishes `close_usage_impact_drawer`
    /// and lets the bus round trip hide it.
    pub fn toggle(&self) -> Result<(), BusError> {
        let mut outbox = Outbox::default();
        outbox.push(&self.scope, PanelEvent::CloseUsageImpactDrawer);
        outbox.flush(&self.bus)
    }

    pub fn subscription(&self) -> &PanelSubscription {
        &self.subscription
    }

    pub fn teardown(&self) {
        self.subscription.release();
    }
}
