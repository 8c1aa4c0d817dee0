// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

// Helper to parse CLI args
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn start_requires_token() {
    let cli = parse(&["pushsync", "start", "--token", "abc"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Start {
            token: "abc".to_string()
        }
    );

    assert!(parse(&["pushsync", "start"]).is_err());
    assert!(parse(&["pushsync", "start", "--token", "  "]).is_err());
}

#[test]
fn subscribe_takes_many_interests() {
    let cli = parse(&["pushsync", "subscribe", "news", "sports"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Subscribe {
            interests: strings(&["news", "sports"])
        }
    );
    assert!(parse(&["pushsync", "subscribe"]).is_err());
    assert!(parse(&["pushsync", "unsubscribe"]).is_err());
}

#[test]
fn set_subscriptions_may_be_empty() {
    let cli = parse(&["pushsync", "set-subscriptions"]).unwrap();
    assert_eq!(
        cli.command,
        Command::SetSubscriptions {
            interests: Vec::new()
        }
    );
}

#[test]
fn set_user_requires_auth_token() {
    let cli = parse(&["pushsync", "set-user", "alice", "--auth-token", "jwt"]).unwrap();
    assert_eq!(
        cli.command,
        Command::SetUser {
            user_id: "alice".to_string(),
            auth_token: "jwt".to_string(),
        }
    );
    assert!(parse(&["pushsync", "set-user", "alice"]).is_err());
}

#[test]
fn report_delivery_flags() {
    let cli = parse(&[
        "pushsync",
        "report",
        "delivery",
        "pub-1",
        "--background",
        "--data",
    ])
    .unwrap();
    assert_eq!(
        cli.command,
        Command::Report {
            event: ReportKind::Delivery,
            publish_id: "pub-1".to_string(),
            background: true,
            displayable: false,
            data: true,
        }
    );
    assert!(parse(&["pushsync", "report", "bounce", "pub-1"]).is_err());
}

#[test]
fn global_flags_work_after_the_command() {
    let cli = parse(&[
        "pushsync",
        "status",
        "--instance-id",
        "abc",
        "--state-dir",
        "/tmp/state",
        "--base-url",
        "http://localhost:8080/",
        "--wait",
        "0",
        "-o",
        "json",
    ])
    .unwrap();

    assert_eq!(cli.command, Command::Status);
    assert_eq!(cli.global.instance_id.as_deref(), Some("abc"));
    assert_eq!(
        cli.global.state_dir.as_deref(),
        Some(std::path::Path::new("/tmp/state"))
    );
    assert_eq!(
        cli.global.base_url.as_deref(),
        Some("http://localhost:8080/")
    );
    assert_eq!(cli.global.wait, 0);
    assert_eq!(cli.global.output, OutputFormat::Json);
}

#[test]
fn defaults() {
    let cli = parse(&["pushsync", "-c", "pushsync.toml", "drain"]).unwrap();
    assert_eq!(cli.global.wait, 10);
    assert_eq!(cli.global.output, OutputFormat::Text);
    assert_eq!(
        cli.global.config.as_deref(),
        Some(std::path::Path::new("pushsync.toml"))
    );
}

#[test]
fn init_takes_force() {
    let cli = parse(&["pushsync", "-i", "abc", "init", "--force"]).unwrap();
    assert_eq!(cli.command, Command::Init { force: true });
    assert_eq!(cli.global.instance_id.as_deref(), Some("abc"));

    let cli = parse(&["pushsync", "init"]).unwrap();
    assert_eq!(cli.command, Command::Init { force: false });
}

#[parameterized(
    init = { &["pushsync", "init"], false },
    start = { &["pushsync", "start", "--token", "t"], true },
    subscribe = { &["pushsync", "subscribe", "a"], true },
    unsubscribe = { &["pushsync", "unsubscribe", "a"], true },
    set_subscriptions = { &["pushsync", "set-subscriptions", "a"], true },
    set_user = { &["pushsync", "set-user", "u", "--auth-token", "t"], true },
    refresh_token = { &["pushsync", "refresh-token", "t"], true },
    interests = { &["pushsync", "interests"], false },
    status = { &["pushsync", "status"], false },
    drain = { &["pushsync", "drain"], false },
    clear = { &["pushsync", "clear"], false },
    report = { &["pushsync", "report", "open", "p"], false },
)]
fn mutating_commands(args: &[&str], mutates: bool) {
    assert_eq!(parse(args).unwrap().command.mutates(), mutates);
}
