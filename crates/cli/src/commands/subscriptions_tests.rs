// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::{output, Harness};
use crate::error::Error;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn subscribe_before_start_is_local() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let printed = output(|out| subscribe(&ctx, &strings(&["news", "sports"]), out).unwrap());
    assert_eq!(printed, "Subscribed to news\nSubscribed to sports\n");
    assert!(h.coordinator.pending_operations().unwrap().is_empty());

    let listed = output(|out| list(&ctx, out).unwrap());
    assert_eq!(listed, "news\nsports\n");
}

#[tokio::test]
async fn list_as_json() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Json);
    subscribe(&ctx, &strings(&["b", "a"]), &mut Vec::new()).unwrap();

    let listed = output(|out| list(&ctx, out).unwrap());
    let parsed: Vec<String> = serde_json::from_str(&listed).unwrap();
    assert_eq!(parsed, strings(&["a", "b"]));
}

#[tokio::test]
async fn unsubscribe_and_replace() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);
    subscribe(&ctx, &strings(&["a", "b"]), &mut Vec::new()).unwrap();

    let printed = output(|out| unsubscribe(&ctx, &strings(&["a"]), out).unwrap());
    assert_eq!(printed, "Unsubscribed from a\n");

    let printed = output(|out| set_subscriptions(&ctx, strings(&["x", "y"]), out).unwrap());
    assert_eq!(printed, "Interests set (2)\n");
    assert_eq!(output(|out| list(&ctx, out).unwrap()), "x\ny\n");

    set_subscriptions(&ctx, Vec::new(), &mut Vec::new()).unwrap();
    assert_eq!(output(|out| list(&ctx, out).unwrap()), "");
}

#[tokio::test]
async fn invalid_interest_stops_at_first_error() {
    let h = Harness::new();
    let ctx = h.ctx(OutputFormat::Text);

    let mut out = Vec::new();
    let result = subscribe(&ctx, &strings(&["ok", "not ok", "never"]), &mut out);

    assert!(matches!(
        result,
        Err(Error::Sync(pushsync::Error::Validation(_)))
    ));
    assert_eq!(String::from_utf8(out).unwrap(), "Subscribed to ok\n");
    assert_eq!(output(|out| list(&ctx, out).unwrap()), "ok\n");
}
