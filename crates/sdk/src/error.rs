// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::registry::RegistryError;

/// All possible errors returned by pushsync.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input was rejected before anything was stored or queued.
    #[error("{0}")]
    Validation(String),

    /// The call is not allowed in the current device state.
    #[error("{0}")]
    Precondition(String),

    /// Local device state or the operation queue could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(ps_core::Error),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The registry refused to register the device.
    #[error("registration failed: {0}")]
    Registration(String),

    #[error("config error: {0}")]
    Config(String),

    /// The instance was shut down while the call was waiting.
    #[error("instance was shut down")]
    Stopped,
}

impl From<ps_core::Error> for Error {
    fn from(e: ps_core::Error) -> Self {
        if e.is_validation() {
            Error::Validation(e.to_string())
        } else {
            Error::Persistence(e)
        }
    }
}

/// A specialized Result type for pushsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
