// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn args() -> GlobalArgs {
    GlobalArgs::default()
}

#[test]
fn instance_id_flag_is_enough() {
    let cwd = TempDir::new().unwrap();
    let config = resolve(
        &GlobalArgs {
            instance_id: Some("abc".into()),
            ..args()
        },
        cwd.path(),
    )
    .unwrap();

    assert_eq!(config.instance_id, "abc");
    assert_eq!(config.base_url, None);
}

#[test]
fn missing_instance_id_is_an_error() {
    let cwd = TempDir::new().unwrap();
    let err = resolve(&args(), cwd.path()).unwrap_err();
    assert!(matches!(err, Error::MissingInstanceId));
}

#[test]
fn default_config_file_is_loaded() {
    let cwd = TempDir::new().unwrap();
    std::fs::write(
        cwd.path().join(DEFAULT_CONFIG_FILE),
        "instance_id = \"from-file\"\nbase_url = \"http://localhost:8080/\"\n",
    )
    .unwrap();

    let config = resolve(&args(), cwd.path()).unwrap();
    assert_eq!(config.instance_id, "from-file");
    assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/"));
}

#[test]
fn flags_override_config_file() {
    let cwd = TempDir::new().unwrap();
    let path = cwd.path().join("custom.toml");
    std::fs::write(&path, "instance_id = \"from-file\"\n").unwrap();

    let config = resolve(
        &GlobalArgs {
            config: Some(path),
            instance_id: Some("from-flag".into()),
            state_dir: Some("state".into()),
            base_url: Some("http://127.0.0.1:9000/".into()),
            ..args()
        },
        cwd.path(),
    )
    .unwrap();

    assert_eq!(config.instance_id, "from-flag");
    assert_eq!(config.state_dir, Some(cwd.path().join("state")));
    assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:9000/"));
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let cwd = TempDir::new().unwrap();
    let result = resolve(
        &GlobalArgs {
            config: Some(cwd.path().join("missing.toml")),
            instance_id: Some("abc".into()),
            ..args()
        },
        cwd.path(),
    );
    assert!(matches!(result, Err(Error::Sync(pushsync::Error::Config(_)))));
}

#[parameterized(
    empty_id = { "instance_id = \"\"\n" },
    zero_base_delay = { "instance_id = \"a\"\n[retry]\nbase_delay_ms = 0\n" },
    limited_without_attempts = { "instance_id = \"a\"\n[retry]\npolicy = \"limited\"\n" },
)]
fn invalid_config_file_is_rejected(content: &str) {
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join(DEFAULT_CONFIG_FILE), content).unwrap();

    let result = resolve(&args(), cwd.path());
    assert!(matches!(result, Err(Error::Sync(pushsync::Error::Config(_)))));
}
