// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of one instance inside a state directory.

use std::path::{Path, PathBuf};

use crate::device::validate_instance_id;
use crate::error::Result;

const STATE_SUFFIX: &str = "device.json";
const QUEUE_SUFFIX: &str = "jobqueue";
const LOCK_SUFFIX: &str = "lock";

/// File locations for a single instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstancePaths {
    dir: PathBuf,
    instance_id: String,
}

impl InstancePaths {
    /// Validates the instance id and computes the file layout.
    pub fn new(dir: impl AsRef<Path>, instance_id: &str) -> Result<Self> {
        validate_instance_id(instance_id)?;
        Ok(InstancePaths {
            dir: dir.as_ref().to_path_buf(),
            instance_id: instance_id.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Device state record.
    pub fn state(&self) -> PathBuf {
        self.file(STATE_SUFFIX)
    }

    /// Pending operation queue.
    pub fn queue(&self) -> PathBuf {
        self.file(QUEUE_SUFFIX)
    }

    /// Advisory lock guarding the instance against a second process.
    pub fn lock(&self) -> PathBuf {
        self.file(LOCK_SUFFIX)
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.instance_id, suffix))
    }
}
