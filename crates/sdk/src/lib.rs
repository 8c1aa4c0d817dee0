// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pushsync: keeps a device's push-notification registration in sync
//!
//! A [`SyncCoordinator`] records interest and user changes locally, queues
//! them durably, and replays them against the registry in order from a
//! background worker, retrying failures according to a [`RetryStrategy`].

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod reporting;
pub mod retry;

mod coordinator;
mod scope;
mod worker;

pub use auth::{StaticTokenProvider, TokenError, TokenProvider};
pub use config::Config;
pub use coordinator::{default_metadata, Registration, SyncCoordinator, SyncCoordinatorBuilder};
pub use error::{Error, Result};
pub use registry::{HttpRegistry, RegisterDeviceResult, Registry, RegistryError};
pub use reporting::{HttpReporter, ReportEvent};
pub use retry::{Backoff, RetryPolicy, RetryStrategy};
pub use scope::RegistrationStatus;

pub use ps_core::{DeviceMetadata, InterestSet, OpPayload, QueuedOperation, MAX_INTERESTS};
