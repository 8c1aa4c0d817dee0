// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device identity and the persisted per-instance device state.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interest::InterestSet;

/// Maximum length of a user id.
pub const MAX_USER_ID_LENGTH: usize = 164;

/// This installation's registration with the registry.
///
/// `device_id` stays `None` until the first registration succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub instance_id: String,
    pub device_id: Option<String>,
}

impl DeviceIdentity {
    pub fn new(instance_id: impl Into<String>, device_id: Option<String>) -> Self {
        DeviceIdentity {
            instance_id: instance_id.into(),
            device_id,
        }
    }
}

/// Metadata describing the client, sent with registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub sdk_version: String,
    #[serde(rename = "androidVersion")]
    pub platform_version: String,
}

impl DeviceMetadata {
    pub fn new(sdk_version: impl Into<String>, platform_version: impl Into<String>) -> Self {
        DeviceMetadata {
            sdk_version: sdk_version.into(),
            platform_version: platform_version.into(),
        }
    }
}

/// Everything the client remembers about one instance between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Push token the device was last registered or refreshed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub interests: InterestSet,
    /// Device ids this installation held before the registry forgot them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_device_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DeviceMetadata>,
}

impl DeviceState {
    /// Creates an empty state for an instance.
    pub fn new(instance_id: impl Into<String>) -> Self {
        DeviceState {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.instance_id.clone(), self.device_id.clone())
    }

    /// Returns true when nothing beyond the instance id has been recorded.
    pub fn is_blank(&self) -> bool {
        self.device_id.is_none()
            && self.token.is_none()
            && self.user_id.is_none()
            && self.interests.is_empty()
            && self.previous_device_ids.is_empty()
            && self.metadata.is_none()
    }
}

/// Validates an instance id before it is used to name files on disk.
pub fn validate_instance_id(instance_id: &str) -> Result<()> {
    let valid = !instance_id.is_empty()
        && instance_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInstanceId(instance_id.to_string()))
    }
}

/// Validates a user id before associating it with the device.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id.chars().count() > MAX_USER_ID_LENGTH {
        return Err(Error::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
