// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ps-core operations.

use thiserror::Error;

/// All possible errors that can occur in ps-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid interest: '{0}'\n  hint: interests are 1-164 characters from a-z, A-Z, 0-9 and _-=@,.;")]
    InvalidInterest(String),

    #[error("too many interests: {count}\n  hint: a device can subscribe to at most {max} interests")]
    TooManyInterests { count: usize, max: usize },

    #[error("invalid user id: '{0}'\n  hint: user ids are 1-164 characters long")]
    InvalidUserId(String),

    #[error("invalid instance id: '{0}'\n  hint: instance ids contain only letters, digits and '-'")]
    InvalidInstanceId(String),

    #[error("device is already registered as {existing}, refusing to replace it with {new}")]
    IdentityConflict { existing: String, new: String },

    #[error("instance {0} is in use by another process")]
    InstanceLocked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true for errors caused by caller input rather than storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidInterest(_)
                | Error::TooManyInterests { .. }
                | Error::InvalidUserId(_)
                | Error::InvalidInstanceId(_)
        )
    }
}

/// A specialized Result type for ps-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
