// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operations waiting to reach the registry.
//!
//! Every accepted mutation becomes a [`QueuedOperation`]. The same operation
//! list is replayed against the local interest set and sent to the registry,
//! so the two stay reconciled by construction. All payloads are idempotent
//! on the registry side, which makes re-sending after a crash safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceMetadata;
use crate::interest::InterestSet;

/// A persisted operation with its queue position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedOperation {
    /// Monotonic sequence number within one queue file.
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    pub payload: OpPayload,
}

impl QueuedOperation {
    pub fn new(seq: u64, created_at: DateTime<Utc>, payload: OpPayload) -> Self {
        QueuedOperation {
            seq,
            created_at,
            payload,
        }
    }
}

/// Payload describing the remote mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpPayload {
    /// Register this installation and obtain a device id.
    Register {
        token: String,
        known_previous_device_ids: Vec<String>,
        metadata: DeviceMetadata,
    },

    /// Add a single interest.
    Subscribe { interest: String },

    /// Remove a single interest.
    Unsubscribe { interest: String },

    /// Replace the whole interest set.
    SetSubscriptions { interests: InterestSet },

    /// Update the push token of a registered device.
    RefreshToken { token: String },

    /// Update the client metadata of a registered device.
    SetMetadata { metadata: DeviceMetadata },

    /// Associate the device with an authenticated user.
    SetUserId { user_id: String },
}

impl OpPayload {
    /// Creates a Register payload.
    pub fn register(
        token: String,
        known_previous_device_ids: Vec<String>,
        metadata: DeviceMetadata,
    ) -> Self {
        OpPayload::Register {
            token,
            known_previous_device_ids,
            metadata,
        }
    }

    /// Creates a Subscribe payload.
    pub fn subscribe(interest: String) -> Self {
        OpPayload::Subscribe { interest }
    }

    /// Creates an Unsubscribe payload.
    pub fn unsubscribe(interest: String) -> Self {
        OpPayload::Unsubscribe { interest }
    }

    /// Creates a SetSubscriptions payload.
    pub fn set_subscriptions(interests: InterestSet) -> Self {
        OpPayload::SetSubscriptions { interests }
    }

    /// Creates a RefreshToken payload.
    pub fn refresh_token(token: String) -> Self {
        OpPayload::RefreshToken { token }
    }

    /// Creates a SetMetadata payload.
    pub fn set_metadata(metadata: DeviceMetadata) -> Self {
        OpPayload::SetMetadata { metadata }
    }

    /// Creates a SetUserId payload.
    pub fn set_user_id(user_id: String) -> Self {
        OpPayload::SetUserId { user_id }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OpPayload::Register { .. } => "register",
            OpPayload::Subscribe { .. } => "subscribe",
            OpPayload::Unsubscribe { .. } => "unsubscribe",
            OpPayload::SetSubscriptions { .. } => "set_subscriptions",
            OpPayload::RefreshToken { .. } => "refresh_token",
            OpPayload::SetMetadata { .. } => "set_metadata",
            OpPayload::SetUserId { .. } => "set_user_id",
        }
    }

    /// Returns true if the operation addresses an already registered device.
    pub fn requires_device_id(&self) -> bool {
        !matches!(self, OpPayload::Register { .. })
    }

    /// Applies the interest effect of this operation to `interests`.
    ///
    /// Operations that do not touch interests leave the set unchanged.
    pub fn apply_to(&self, interests: &mut InterestSet) {
        match self {
            OpPayload::Subscribe { interest } => {
                interests.insert(interest.clone());
            }
            OpPayload::Unsubscribe { interest } => {
                interests.remove(interest);
            }
            OpPayload::SetSubscriptions { interests: set } => {
                interests.clone_from(set);
            }
            OpPayload::Register { .. }
            | OpPayload::RefreshToken { .. }
            | OpPayload::SetMetadata { .. }
            | OpPayload::SetUserId { .. } => {}
        }
    }
}

/// Replays `ops` on top of `base` and returns the resulting interest set.
pub fn replay<'a>(
    base: InterestSet,
    ops: impl IntoIterator<Item = &'a OpPayload>,
) -> InterestSet {
    ops.into_iter().fold(base, |mut interests, op| {
        op.apply_to(&mut interests);
        interests
    })
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
