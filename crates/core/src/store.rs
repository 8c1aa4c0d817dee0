// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable local record of a device's identity, interests and user.
//!
//! The store keeps the decoded [`DeviceState`] in memory and writes the whole
//! record through to disk on every mutation. It does no locking of its own;
//! callers serialize access per instance.

use crate::device::{DeviceIdentity, DeviceMetadata, DeviceState};
use crate::error::{Error, Result};
use crate::interest::InterestSet;
use crate::jsonl;
use crate::paths::InstancePaths;

/// Device state for one instance, backed by `<instance>.device.json`.
#[derive(Debug)]
pub struct DeviceStateStore {
    paths: InstancePaths,
    state: DeviceState,
}

impl DeviceStateStore {
    /// Opens the store, loading any previously saved state.
    pub fn open(paths: InstancePaths) -> Result<Self> {
        std::fs::create_dir_all(paths.dir())?;
        let state = match jsonl::read_json::<DeviceState>(&paths.state())? {
            Some(state) if state.instance_id != paths.instance_id() => {
                return Err(Error::CorruptedData(format!(
                    "{} belongs to instance {}",
                    paths.state().display(),
                    state.instance_id
                )))
            }
            Some(state) => state,
            None => DeviceState::new(paths.instance_id()),
        };
        Ok(DeviceStateStore { paths, state })
    }

    pub fn paths(&self) -> &InstancePaths {
        &self.paths
    }

    /// Full state snapshot.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Returns the identity once a device id has been recorded.
    pub fn get(&self) -> Option<DeviceIdentity> {
        self.state.device_id.as_ref().map(|_| self.state.identity())
    }

    pub fn device_id(&self) -> Option<&str> {
        self.state.device_id.as_deref()
    }

    /// Records the device identity.
    ///
    /// Storing the same device id again is a no-op; replacing a different one
    /// is refused because a device never changes id while its state persists.
    pub fn put(&mut self, identity: DeviceIdentity) -> Result<()> {
        if identity.instance_id != self.state.instance_id {
            return Err(Error::CorruptedData(format!(
                "identity for instance {} stored under {}",
                identity.instance_id, self.state.instance_id
            )));
        }
        let Some(new) = identity.device_id else {
            return Ok(());
        };
        match self.state.device_id.as_deref() {
            Some(existing) if existing == new => Ok(()),
            Some(existing) => Err(Error::IdentityConflict {
                existing: existing.to_string(),
                new,
            }),
            None => self.update(|s| s.device_id = Some(new)),
        }
    }

    /// Drops the current device id, remembering it as a previous id.
    ///
    /// Returns the forgotten id.
    pub fn forget_device(&mut self) -> Result<Option<String>> {
        let Some(old) = self.state.device_id.clone() else {
            return Ok(None);
        };
        self.update(|s| {
            s.device_id = None;
            if !s.previous_device_ids.contains(&old) {
                s.previous_device_ids.push(old.clone());
            }
        })?;
        Ok(Some(old))
    }

    pub fn previous_device_ids(&self) -> &[String] {
        &self.state.previous_device_ids
    }

    pub fn interests(&self) -> &InterestSet {
        &self.state.interests
    }

    pub fn set_interests(&mut self, interests: InterestSet) -> Result<()> {
        if self.state.interests == interests {
            return Ok(());
        }
        self.update(|s| s.interests = interests)
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) -> Result<()> {
        if self.state.token == token {
            return Ok(());
        }
        self.update(|s| s.token = token)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.state.user_id.as_deref()
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) -> Result<()> {
        if self.state.user_id == user_id {
            return Ok(());
        }
        self.update(|s| s.user_id = user_id)
    }

    pub fn metadata(&self) -> Option<&DeviceMetadata> {
        self.state.metadata.as_ref()
    }

    /// Saves the push token and metadata a start was made with, in one write.
    pub fn set_session(&mut self, token: String, metadata: DeviceMetadata) -> Result<()> {
        if self.state.token.as_deref() == Some(token.as_str())
            && self.state.metadata.as_ref() == Some(&metadata)
        {
            return Ok(());
        }
        self.update(|s| {
            s.token = Some(token);
            s.metadata = Some(metadata);
        })
    }

    /// Removes the saved state and the instance's queue file.
    ///
    /// Returns true if anything was removed or reset.
    pub fn clear(&mut self) -> Result<bool> {
        let had_state = jsonl::remove(&self.paths.state())?;
        let had_queue = jsonl::remove(&self.paths.queue())?;
        let had_memory = !self.state.is_blank();
        self.state = DeviceState::new(self.paths.instance_id());
        Ok(had_state || had_queue || had_memory)
    }

    /// Applies `f` to a copy of the state, persists it, then commits it in
    /// memory. A failed write leaves the in-memory state untouched.
    fn update(&mut self, f: impl FnOnce(&mut DeviceState)) -> Result<()> {
        let mut next = self.state.clone();
        f(&mut next);
        jsonl::write_json(&self.paths.state(), &next)?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
