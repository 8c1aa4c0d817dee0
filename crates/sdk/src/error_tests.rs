// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]

use super::*;
use yare::parameterized;

#[parameterized(
    interest = { ps_core::Error::InvalidInterest("a b".into()) },
    too_many = { ps_core::Error::TooManyInterests { count: 5001, max: 5000 } },
    user = { ps_core::Error::InvalidUserId(String::new()) },
    instance = { ps_core::Error::InvalidInstanceId("a/b".into()) },
)]
fn core_validation_errors_become_validation(err: ps_core::Error) {
    let message = err.to_string();
    match Error::from(err) {
        Error::Validation(m) => assert_eq!(m, message),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[parameterized(
    locked = { ps_core::Error::InstanceLocked("i".into()) },
    corrupted = { ps_core::Error::CorruptedData("bad".into()) },
    conflict = { ps_core::Error::IdentityConflict { existing: "a".into(), new: "b".into() } },
)]
fn core_storage_errors_become_persistence(err: ps_core::Error) {
    assert!(matches!(Error::from(err), Error::Persistence(_)));
}

#[test]
fn persistence_message_wraps_source() {
    let err = Error::from(ps_core::Error::InstanceLocked("i".into()));
    assert_eq!(
        err.to_string(),
        "persistence error: instance i is in use by another process"
    );
}
