use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{lock, Outbox, PanelSubscription, SharedView};
use crate::bus::{BusError, EventBus};
use crate::config::Config;
use crate::events::{BreadcrumbItem, NavigationTarget, PanelEvent};

/// Target that returns to the application root
pub const ROOT_TARGET: &str = "ROOT";
/// Prefix of targets that select a tab
pub const TAB_PREFIX: &str = "TAB_";

/// What the breadcrumb panel currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BreadcrumbView {
    pub items: Vec<BreadcrumbItem>,
}

impl BreadcrumbView {
    /// The last item is the page the user is on
    pub fn active_index(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }
}

/// Turns breadcrumb clicks into navigation events.
///
/// Listens for `update_breadcrumb` on the breadcrumb scope and publishes
/// `close_edit_*` / `breadcrumb_navigate` on the navigation scope.
pub struct BreadcrumbCoordinator {
    bus: Arc<EventBus>,
    navigation_scope: String,
    view_targets: Vec<String>,
    view: SharedView<BreadcrumbView>,
    subscription: PanelSubscription,
}

impl BreadcrumbCoordinator {
    pub fn new(bus: &Arc<EventBus>, config: &Config) -> Self {
        let view: SharedView<BreadcrumbView> = Arc::default();
        let subscription = PanelSubscription::attach(
            bus,
            &config.scopes.breadcrumb,
            "breadcrumb",
            &view,
            |state: &mut BreadcrumbView, event, _outbox| match event {
                PanelEvent::UpdateBreadcrumb(trail) => {
                    tracing::debug!(items = trail.items.len(), "Breadcrumb updated");
                    state.items = trail.items;
                }
                PanelEvent::OpenConfirmationModal(_)
                | PanelEvent::ConfirmationConfirmed(_)
                | PanelEvent::OpenUsageImpactDrawer(_)
                | PanelEvent::CloseUsageImpactDrawer
                | PanelEvent::BreadcrumbNavigate(_)
                | PanelEvent::CloseEditMapping
                | PanelEvent::CloseEditModel
                | PanelEvent::CloseEditRule
                | PanelEvent::CloseEditCodeset => {}
            },
        );

        Self {
            bus: Arc::clone(bus),
            navigation_scope: config.scopes.navigation.clone(),
            view_targets: config.breadcrumb.view_targets.clone(),
            view,
            subscription,
        }
    }

    pub fn view(&self) -> BreadcrumbView {
        lock(&self.view).clone()
    }

    /// Handle a click on the item at `index`
    pub fn click(&self, index: usize) -> Result<(), BusError> {
        let item = {
            let view = lock(&self.view);
            if view.active_index() == Some(index) {
                tracing::debug!(index, "Clicked active breadcrumb, ignoring");
                return Ok(());
            }
            match view.items.get(index) {
                Some(item) => item.clone(),
                None => {
                    tracing::debug!(index, "Breadcrumb index out of range");
                    return Ok(());
                }
            }
        };

        let Some(events) = plan_navigation(&item, &self.view_targets) else {
            tracing::debug!(destination = %item.target, "Breadcrumb target has no route");
            return Ok(());
        };

        tracing::info!(destination = %item.target, "Breadcrumb navigation");
        let mut outbox = Outbox::default();
        for event in events {
            outbox.push(&self.navigation_scope, event);
        }
        outbox.flush(&self.bus)
    }

    pub fn subscription(&self) -> &PanelSubscription {
        &self.subscription
    }

    pub fn teardown(&self) {
        self.subscription.release();
    }
}

/// Events to publish for a click on `item`, or `None` if the target is not
/// navigable.
///
/// View targets navigate directly. `ROOT` and tab targets first close every
/// open editor (mapping, model, rule, codeset), then navigate; only tab
/// targets carry a tab index.
pub fn plan_navigation(item: &BreadcrumbItem, view_targets: &[String]) -> Option<Vec<PanelEvent>> {
    if view_targets.iter().any(|t| t == &item.target) {
        return Some(vec![PanelEvent::BreadcrumbNavigate(NavigationTarget {
            target: item.target.clone(),
            tab_index: None,
        })]);
    }

    let is_tab = item.target.starts_with(TAB_PREFIX);
    if item.target != ROOT_TARGET && !is_tab {
        return None;
    }

    let mut events = PanelEvent::CLOSE_EDITS.to_vec();
    events.push(PanelEvent::BreadcrumbNavigate(NavigationTarget {
        target: item.target.clone(),
        tab_index: if is_tab { item.tab_index } else { None },
    }));
    Some(events)
}
