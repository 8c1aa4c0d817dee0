// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ps-core: Durable local state for pushsync
//!
//! This crate provides interest validation, the persisted device state, and
//! the crash-safe operation queue shared by the pushsync SDK and CLI.

pub mod device;
pub mod error;
pub mod interest;
pub mod jsonl;
pub mod lock;
pub mod op;
pub mod paths;
pub mod queue;
pub mod store;

pub use device::{DeviceIdentity, DeviceMetadata, DeviceState};
pub use error::{Error, Result};
pub use interest::{InterestSet, MAX_INTERESTS, MAX_INTEREST_LENGTH};
pub use lock::InstanceLock;
pub use op::{replay, OpPayload, QueuedOperation};
pub use paths::InstancePaths;
pub use queue::OperationQueue;
pub use store::DeviceStateStore;
