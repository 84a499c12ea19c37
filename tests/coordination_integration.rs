//! Cross-panel coordination integration tests
//!
//! Exercises the bus and the coordinators together through the public
//! library API only, the way a host application wires them.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use switchboard::coordinators::{
    BreadcrumbCoordinator, ConfirmationCoordinator, DrawerCoordinator,
};
use switchboard::events::{PanelEvent, OPEN_CONFIRMATION_MODAL, UPDATE_BREADCRUMB};
use switchboard::steps::{StepSequencer, StepStatus, StepTask};
use switchboard::{Config, EventBus, EventEnvelope, SubscriptionHandle};

type Seen = Arc<Mutex<Vec<EventEnvelope>>>;

fn tap(bus: &EventBus, scope: &str) -> (SubscriptionHandle, Seen) {
    let seen = Seen::default();
    let sink = Arc::clone(&seen);
    let handle = bus.subscribe(scope, move |env| sink.lock().unwrap().push(env.clone()));
    (handle, seen)
}

fn names(seen: &Seen) -> Vec<String> {
    seen.lock().unwrap().iter().map(|e| e.event.clone()).collect()
}

fn breadcrumb_trail() -> Value {
    json!({"items": [
        {"label": "Home", "target": "ROOT"},
        {"label": "X", "target": "TAB_X"},
        {"label": "Y", "target": "TAB_Y", "active": true}
    ]})
}

#[test]
fn publish_notifies_every_listener_of_scope_once() {
    let bus = EventBus::default();
    let (_a1, seen_a1) = tap(&bus, "tables");
    let (_a2, seen_a2) = tap(&bus, "tables");
    let (_b, seen_b) = tap(&bus, "modals");

    bus.publish("tables", "row_selected", json!({"id": 7})).unwrap();

    for seen in [&seen_a1, &seen_a2] {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], EventEnvelope::new("row_selected", json!({"id": 7})));
    }
    assert!(seen_b.lock().unwrap().is_empty());
}

#[test]
fn late_subscriber_sees_only_latest_value() {
    let bus = EventBus::default();
    bus.publish("tables", "p1", json!(1)).unwrap();
    bus.publish("tables", "p2", json!(2)).unwrap();

    let (_h, seen) = tap(&bus, "tables");
    assert_eq!(names(&seen), vec!["p2".to_string()]);
}

#[test]
fn unsubscribe_twice_is_harmless() {
    let bus = EventBus::default();
    let (handle, seen) = tap(&bus, "tables");
    bus.unsubscribe(&handle);
    bus.unsubscribe(&handle);
    bus.publish("tables", "after", Value::Null).unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn clicking_active_breadcrumb_publishes_nothing() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let breadcrumb = BreadcrumbCoordinator::new(&bus, &config);
    bus.publish(&config.scopes.breadcrumb, UPDATE_BREADCRUMB, breadcrumb_trail())
        .unwrap();

    let (_h, seen) = tap(&bus, &config.scopes.navigation);
    breadcrumb.click(2).unwrap();
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn clicking_root_closes_edits_then_navigates() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let breadcrumb = BreadcrumbCoordinator::new(&bus, &config);
    bus.publish(&config.scopes.breadcrumb, UPDATE_BREADCRUMB, breadcrumb_trail())
        .unwrap();

    let (_h, seen) = tap(&bus, &config.scopes.navigation);
    breadcrumb.click(0).unwrap();

    assert_eq!(
        names(&seen),
        vec![
            "close_edit_mapping",
            "close_edit_model",
            "close_edit_rule",
            "close_edit_codeset",
            "breadcrumb_navigate",
        ]
    );
    assert_eq!(seen.lock().unwrap()[4].payload, json!({"target": "ROOT"}));
}

#[test]
fn clicking_view_target_navigates_once() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let breadcrumb = BreadcrumbCoordinator::new(&bus, &config);
    bus.publish(
        &config.scopes.breadcrumb,
        UPDATE_BREADCRUMB,
        json!({"items": [
            {"label": "Models", "target": "MODELS"},
            {"label": "Model 4", "target": "TAB_MODEL_4"}
        ]}),
    )
    .unwrap();

    let (_h, seen) = tap(&bus, &config.scopes.navigation);
    breadcrumb.click(0).unwrap();

    assert_eq!(names(&seen), vec!["breadcrumb_navigate"]);
    assert_eq!(seen.lock().unwrap()[0].payload, json!({"target": "MODELS"}));
}

#[test]
fn confirmation_round_trip() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let modal = ConfirmationCoordinator::new(&bus, &config);

    bus.publish(
        &config.scopes.confirmation,
        OPEN_CONFIRMATION_MODAL,
        json!({"command": "delete", "itemName": "Rule A"}),
    )
    .unwrap();

    let view = serde_json::to_value(modal.view()).unwrap();
    assert_eq!(view["isVisible"], json!(true));
    assert_eq!(view["title"], json!("Delete Confirmation"));
    assert_eq!(view["command"], json!("delete"));
    assert_eq!(view["itemName"], json!("Rule A"));
    assert_eq!(view["theme"], json!("dark"));

    let (_h, seen) = tap(&bus, &config.scopes.confirmation);
    seen.lock().unwrap().clear(); // drop the replayed open request
    modal.confirm().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event, "confirmation_delete_confirmed");
    assert_eq!(
        seen[0].payload,
        json!({"itemName": "Rule A", "confirmed": true, "command": "delete"})
    );
    assert!(!modal.is_visible());
}

#[test]
fn requester_acts_on_confirmed_event() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let modal = ConfirmationCoordinator::new(&bus, &config);
    let drawer = DrawerCoordinator::new(&bus, &config);

    // A rules table that deletes only once the modal confirms, then closes
    // the usage drawer without holding a reference to it
    let deleted = Arc::new(Mutex::new(Vec::<String>::new()));
    let _table = {
        let weak_bus = Arc::downgrade(&bus);
        let deleted = Arc::clone(&deleted);
        let drawer_scope = config.scopes.drawer.clone();
        bus.subscribe(&config.scopes.confirmation, move |env| {
            if let Some(PanelEvent::ConfirmationConfirmed(outcome)) = PanelEvent::decode(env) {
                deleted.lock().unwrap().push(outcome.item_name);
                if let Some(bus) = weak_bus.upgrade() {
                    bus.publish_event(&drawer_scope, &PanelEvent::CloseUsageImpactDrawer)
                        .unwrap();
                }
            }
        })
    };

    bus.publish(
        &config.scopes.drawer,
        "open_usage_impact_drawer",
        json!({"fullData": {"usages": 2}}),
    )
    .unwrap();
    bus.publish(
        &config.scopes.confirmation,
        OPEN_CONFIRMATION_MODAL,
        json!({"command": "delete", "itemName": "Rule A"}),
    )
    .unwrap();
    assert!(deleted.lock().unwrap().is_empty());

    modal.confirm().unwrap();

    assert_eq!(*deleted.lock().unwrap(), vec!["Rule A".to_string()]);
    assert!(!drawer.is_visible());
}

#[test]
fn teardown_stops_coordinator_updates() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    let modal = ConfirmationCoordinator::new(&bus, &config);

    modal.teardown();
    modal.teardown();
    bus.publish(
        &config.scopes.confirmation,
        OPEN_CONFIRMATION_MODAL,
        json!({"command": "save"}),
    )
    .unwrap();

    assert!(!modal.is_visible());
    assert_eq!(bus.subscriber_count(&config.scopes.confirmation), 0);
}

#[test]
fn coordinator_built_late_picks_up_cached_state() {
    let bus = Arc::new(EventBus::default());
    let config = Config::default();
    bus.publish(
        &config.scopes.drawer,
        "open_usage_impact_drawer",
        json!({"fullData": "cached"}),
    )
    .unwrap();

    let drawer = DrawerCoordinator::new(&bus, &config);
    assert!(drawer.is_visible());
    assert_eq!(drawer.view().full_data, json!("cached"));
}

#[test]
fn sequencer_forward_and_boundaries() {
    let mut sequencer = StepSequencer::with_steps(vec![
        StepTask::new("select", 0).with_status(StepStatus::InProgress),
        StepTask::new("review", 1),
    ]);

    sequencer.step_backward();
    assert_eq!(sequencer.current().unwrap().index, 0);

    sequencer.step_forward();
    let statuses: Vec<_> = sequencer.steps().iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![StepStatus::Complete, StepStatus::InProgress]);

    sequencer.step_forward();
    let statuses: Vec<_> = sequencer.steps().iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![StepStatus::Complete, StepStatus::InProgress]);
}
