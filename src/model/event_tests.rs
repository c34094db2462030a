//! Tests for `Event` and record event naming.

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::{Event, RecordEventKind, record_event_name};

#[test]
fn at_keeps_explicit_timestamp() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let event = Event::at("orders.afterCreate", ts, json!({"id": 7}));

    assert_eq!(event.name, "orders.afterCreate");
    assert_eq!(event.timestamp, ts);
    assert_eq!(event.payload["id"], 7);
}

#[test]
fn new_stamps_current_time() {
    let before = Utc::now();
    let event = Event::new("orders.afterCreate", json!(null));
    let after = Utc::now();

    assert!(event.timestamp >= before);
    assert!(event.timestamp <= after);
}

#[test]
fn record_event_names_follow_hook_convention() {
    assert_eq!(
        record_event_name("orders", RecordEventKind::AfterCreate),
        "orders.afterCreate"
    );
    assert_eq!(
        record_event_name("orders", RecordEventKind::AfterUpdate),
        "orders.afterUpdate"
    );
    assert_eq!(
        record_event_name("leads", RecordEventKind::AfterDelete),
        "leads.afterDelete"
    );
}
