// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the remote device registry.
//!
//! Provides a trait-based registry layer that enables:
//! - Real HTTP requests for production ([`HttpRegistry`])
//! - Scripted fakes for testing the queue worker
//!
//! A registry knows nothing about retries or persistence. It sends one
//! request and reports what happened.

mod http;

pub use http::{default_base_url, HttpRegistry, LIBRARY_HEADER};
pub(crate) use http::{decode_error, library_version};

use std::future::Future;
use std::pin::Pin;

use ps_core::{DeviceMetadata, InterestSet};

use crate::retry::{Classify, RetryClass};

/// Error type for registry requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The registry answered with a non-2xx status.
    #[error("registry rejected request ({status}): {reason}: {description}")]
    Rejected {
        status: u16,
        reason: String,
        description: String,
    },

    /// The request never got an answer: timeout, DNS, refused connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The registry answered 2xx with a body that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// Returns the HTTP status for rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Rejected { status, .. } => Some(*status),
            RegistryError::Transport(_) | RegistryError::InvalidResponse(_) => None,
        }
    }

    /// Returns true if the registry no longer knows the addressed device.
    pub fn is_device_gone(&self) -> bool {
        self.status() == Some(404)
    }
}

impl Classify for RegistryError {
    fn retry_class(&self) -> RetryClass {
        match self {
            RegistryError::Rejected { status, .. } => match status {
                408 | 429 | 500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            RegistryError::Transport(_) | RegistryError::InvalidResponse(_) => {
                RetryClass::Retryable
            }
        }
    }
}

/// Result type for registry requests.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Boxed future returned by [`Registry`] methods.
pub type RegistryFuture<'a, T> = Pin<Box<dyn Future<Output = RegistryResult<T>> + Send + 'a>>;

/// What the registry returns for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDeviceResult {
    pub device_id: String,
    /// Interests the registry already holds for this device, carried over
    /// from any known previous device id.
    pub initial_interests: InterestSet,
}

/// Request/response view of the registry API for one instance.
///
/// Every method is idempotent on the registry side, so sending the same
/// request twice leaves the device in the same state.
pub trait Registry: Send + Sync {
    /// Registers this installation, returning its device id.
    fn register<'a>(
        &'a self,
        token: &'a str,
        known_previous_device_ids: &'a [String],
        metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, RegisterDeviceResult>;

    fn subscribe<'a>(&'a self, device_id: &'a str, interest: &'a str) -> RegistryFuture<'a, ()>;

    fn unsubscribe<'a>(&'a self, device_id: &'a str, interest: &'a str)
        -> RegistryFuture<'a, ()>;

    /// Replaces the device's whole interest set.
    fn set_subscriptions<'a>(
        &'a self,
        device_id: &'a str,
        interests: &'a InterestSet,
    ) -> RegistryFuture<'a, ()>;

    fn refresh_token<'a>(&'a self, device_id: &'a str, token: &'a str) -> RegistryFuture<'a, ()>;

    fn set_metadata<'a>(
        &'a self,
        device_id: &'a str,
        metadata: &'a DeviceMetadata,
    ) -> RegistryFuture<'a, ()>;

    /// Associates the device with a user, authenticated by `bearer_token`.
    fn set_user_id<'a>(
        &'a self,
        device_id: &'a str,
        user_id: &'a str,
        bearer_token: &'a str,
    ) -> RegistryFuture<'a, ()>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
