// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory lock keeping a second process away from an instance's files.
//!
//! In-process sharing goes through one owner per instance, so the lock is
//! only ever contended across processes.

use std::fs::{self, File};

use fs2::FileExt;

use crate::error::{Error, Result};
use crate::paths::InstancePaths;

/// Held for as long as an instance's files are owned by this process.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
}

impl InstanceLock {
    /// Acquires the lock without blocking.
    pub fn acquire(paths: &InstancePaths) -> Result<Self> {
        fs::create_dir_all(paths.dir())?;
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(paths.lock())?;
        file.try_lock_exclusive()
            .map_err(|_| Error::InstanceLocked(paths.instance_id().to_string()))?;
        Ok(InstanceLock { _file: file })
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
