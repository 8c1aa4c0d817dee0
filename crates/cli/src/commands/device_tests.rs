// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::settle;
use crate::commands::testing::{output, Harness, INSTANCE};

#[tokio::test]
async fn status_of_fresh_instance() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let printed = output(|out| status(&ctx, out).unwrap());

    assert!(printed.contains(&format!("Instance:  {INSTANCE}")));
    assert!(printed.contains("Device:    (not registered)"));
    assert!(printed.contains("Interests: 0"));
    assert!(printed.contains("Queue:     empty"));
    assert!(!printed.contains("User:"));
}

#[tokio::test]
async fn start_without_reachable_registry_stays_queued() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let mut out = Vec::new();
    start(&ctx, "fcm-token", &mut out).await.unwrap();
    settle(&ctx, &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Registration queued\n1 operation(s) still queued; they will be sent on the next run\n"
    );
    let printed = output(|out| status(&ctx, out).unwrap());
    assert!(printed.contains("register"), "{printed}");
}

#[tokio::test]
async fn status_as_json() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Json);
    h.coordinator.subscribe("news").unwrap();
    h.coordinator.start("fcm-token").unwrap();

    let printed = output(|out| status(&ctx, out).unwrap());
    let value: serde_json::Value = serde_json::from_str(&printed).unwrap();

    assert_eq!(value["instance_id"], INSTANCE);
    assert_eq!(value["device_id"], serde_json::Value::Null);
    assert_eq!(value["interests"], serde_json::json!(["news"]));
    assert_eq!(value["pending"][0]["payload"]["type"], "register");
    assert_eq!(value["pending"][1]["payload"]["type"], "set_subscriptions");
}

#[tokio::test]
async fn refresh_token_before_start_is_saved() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let printed = output(|out| refresh_token(&ctx, "fcm-token", out).unwrap());

    assert_eq!(printed, "Token updated\n");
    assert!(h.coordinator.pending_operations().unwrap().is_empty());
    assert!(h.coordinator.resume().unwrap().is_some());
}

#[tokio::test]
async fn clear_reports_whether_anything_was_removed() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);
    h.coordinator.subscribe("news").unwrap();

    let printed = output(|out| clear(&ctx, out).unwrap());
    assert_eq!(printed, format!("Cleared local state for {INSTANCE}\n"));

    let printed = output(|out| clear(&ctx, out).unwrap());
    assert_eq!(printed, "Nothing to clear\n");
}

#[tokio::test]
async fn report_needs_registered_device() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let result = report(
        &ctx,
        ReportKind::Open,
        "pub-1",
        DeliveryFlags::default(),
        &mut Vec::new(),
    )
    .await;

    assert!(matches!(result, Err(Error::NotRegistered)));
}
