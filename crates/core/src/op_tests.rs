// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn metadata() -> DeviceMetadata {
    DeviceMetadata::new("0.1.0", "linux")
}

fn set(items: &[&str]) -> InterestSet {
    items.iter().map(|s| s.to_string()).collect()
}

#[parameterized(
    register = { OpPayload::register("tok".into(), vec![], metadata()), "register", false },
    subscribe = { OpPayload::subscribe("news".into()), "subscribe", true },
    unsubscribe = { OpPayload::unsubscribe("news".into()), "unsubscribe", true },
    set_subscriptions = { OpPayload::set_subscriptions(InterestSet::new()), "set_subscriptions", true },
    refresh_token = { OpPayload::refresh_token("tok".into()), "refresh_token", true },
    set_metadata = { OpPayload::set_metadata(metadata()), "set_metadata", true },
    set_user_id = { OpPayload::set_user_id("alice".into()), "set_user_id", true },
)]
fn payload_kind_and_device_requirement(payload: OpPayload, kind: &str, needs_device: bool) {
    assert_eq!(payload.kind(), kind);
    assert_eq!(payload.requires_device_id(), needs_device);
}

#[test]
fn apply_subscribe_and_unsubscribe() {
    let mut interests = set(&["a"]);
    OpPayload::subscribe("b".into()).apply_to(&mut interests);
    OpPayload::unsubscribe("a".into()).apply_to(&mut interests);
    assert_eq!(interests, set(&["b"]));
}

#[test]
fn apply_set_subscriptions_replaces() {
    let mut interests = set(&["a", "b"]);
    OpPayload::set_subscriptions(set(&["c"])).apply_to(&mut interests);
    assert_eq!(interests, set(&["c"]));
}

#[test]
fn apply_non_interest_ops_is_noop() {
    let mut interests = set(&["a"]);
    OpPayload::register("tok".into(), vec![], metadata()).apply_to(&mut interests);
    OpPayload::refresh_token("tok".into()).apply_to(&mut interests);
    OpPayload::set_user_id("alice".into()).apply_to(&mut interests);
    assert_eq!(interests, set(&["a"]));
}

#[test]
fn replay_applies_in_order() {
    let ops = [
        OpPayload::subscribe("news".into()),
        OpPayload::subscribe("sports".into()),
        OpPayload::unsubscribe("news".into()),
    ];
    assert_eq!(replay(InterestSet::new(), &ops), set(&["sports"]));
}

#[test]
fn replay_set_subscriptions_establishes_new_baseline() {
    let ops = [
        OpPayload::subscribe("a".into()),
        OpPayload::set_subscriptions(set(&["x"])),
        OpPayload::subscribe("y".into()),
    ];
    assert_eq!(replay(set(&["server"]), &ops), set(&["x", "y"]));
}

#[test]
fn payload_json_format() {
    let json = serde_json::to_string(&OpPayload::subscribe("news".into())).unwrap();
    assert_eq!(json, r#"{"type":"subscribe","interest":"news"}"#);

    let json =
        serde_json::to_string(&OpPayload::register("tok".into(), vec!["d0".into()], metadata()))
            .unwrap();
    assert!(json.contains(r#""type":"register""#));
    assert!(json.contains(r#""known_previous_device_ids":["d0"]"#));
}

#[test]
fn queued_operation_json_parses_back() {
    let op = QueuedOperation::new(
        7,
        chrono::Utc::now(),
        OpPayload::set_subscriptions(set(&["a", "b"])),
    );
    let json = serde_json::to_string(&op).unwrap();
    let parsed: QueuedOperation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, op);
}
