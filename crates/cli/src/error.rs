// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors reported by the `pushsync` command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sync(#[from] pushsync::Error),

    #[error("no instance id\n  hint: pass --instance-id or set instance_id in pushsync.toml")]
    MissingInstanceId,

    #[error("config file already exists at {0}\n  hint: pass --force to overwrite it")]
    AlreadyInitialized(String),

    #[error("'{0}' does not run against an instance")]
    NeedsNoInstance(&'static str),

    #[error("device was never started\n  hint: run 'pushsync start --token <token>' first")]
    NotStarted,

    #[error("device is not registered yet\n  hint: run 'pushsync drain' and try again")]
    NotRegistered,

    #[error("failed to start runtime: {0}")]
    Runtime(std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for command line operations.
pub type Result<T> = std::result::Result<T, Error>;
