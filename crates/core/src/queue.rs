// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable FIFO of operations waiting for the registry.
//!
//! Uses JSONL format for durability - each operation is written as a single
//! line and fsynced before the caller is told it was accepted. An operation
//! is removed only after the registry confirmed it, by atomically rewriting
//! the file without it. A crash at any point leaves the operation queued, and
//! it is sent again after restart.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::jsonl;
use crate::op::{OpPayload, QueuedOperation};

/// Pending operations for one instance, mirrored in memory.
#[derive(Debug)]
pub struct OperationQueue {
    path: PathBuf,
    pending: VecDeque<QueuedOperation>,
    next_seq: u64,
}

impl OperationQueue {
    /// Opens the queue at `path`, loading operations left by a previous run.
    ///
    /// A write torn by a crash is cut off the file here, so later appends
    /// start on a clean line.
    pub fn open(path: &Path) -> Result<Self> {
        let (records, torn) = jsonl::read_log::<QueuedOperation>(path)?;
        let pending: VecDeque<QueuedOperation> = records.into();
        let ordered = pending
            .iter()
            .zip(pending.iter().skip(1))
            .all(|(a, b)| a.seq < b.seq);
        if !ordered {
            return Err(Error::CorruptedData(format!(
                "{}: operations out of order",
                path.display()
            )));
        }
        if torn {
            tracing::warn!(path = %path.display(), "repairing torn queue file");
            let records: Vec<&QueuedOperation> = pending.iter().collect();
            jsonl::write_all(path, &records)?;
        }
        let next_seq = pending.back().map_or(1, |op| op.seq + 1);

        Ok(OperationQueue {
            path: path.to_path_buf(),
            pending,
            next_seq,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an operation to the tail and returns its sequence number.
    /// The operation is on disk when this returns.
    pub fn push(&mut self, payload: OpPayload) -> Result<u64> {
        let op = QueuedOperation::new(self.next_seq, Utc::now(), payload);
        jsonl::append(&self.path, &op)?;
        self.next_seq += 1;
        self.pending.push_back(op);
        Ok(self.next_seq - 1)
    }

    /// Places operations ahead of everything already queued, in the given
    /// order. Used to recover a registration the registry lost.
    pub fn push_front(&mut self, payloads: Vec<OpPayload>) -> Result<()> {
        if payloads.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let count = payloads.len() as u64;
        let mut renumbered: Vec<QueuedOperation> = payloads
            .into_iter()
            .enumerate()
            .map(|(n, payload)| QueuedOperation::new(n as u64 + 1, now, payload))
            .collect();
        renumbered.extend(self.pending.iter().map(|op| {
            let mut op = op.clone();
            op.seq += count;
            op
        }));

        jsonl::write_all(&self.path, &renumbered)?;
        self.next_seq = renumbered.last().map_or(1, |op| op.seq + 1);
        self.pending = renumbered.into();
        Ok(())
    }

    /// Sequence number the next [`push`](Self::push) will be given.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Removes every operation numbered `seq` or later from the tail.
    ///
    /// Undoes pushes whose accompanying state write failed. Returns how many
    /// operations were removed.
    pub fn discard_from(&mut self, seq: u64) -> Result<usize> {
        let keep = self.pending.iter().take_while(|op| op.seq < seq).count();
        let removed = self.pending.len() - keep;
        if removed == 0 {
            return Ok(0);
        }
        let kept: Vec<&QueuedOperation> = self.pending.iter().take(keep).collect();
        jsonl::write_all(&self.path, &kept)?;
        self.pending.truncate(keep);
        self.next_seq = seq;
        Ok(removed)
    }

    /// The oldest pending operation.
    pub fn front(&self) -> Option<&QueuedOperation> {
        self.pending.front()
    }

    /// Removes the head of the queue if it is still operation `seq`.
    ///
    /// Returns false if the head changed in the meantime (for example after
    /// the queue was purged or reordered), leaving the queue untouched.
    pub fn complete(&mut self, seq: u64) -> Result<bool> {
        if self.pending.front().map(|op| op.seq) != Some(seq) {
            return Ok(false);
        }
        let remaining: Vec<&QueuedOperation> = self.pending.iter().skip(1).collect();
        jsonl::write_all(&self.path, &remaining)?;
        self.pending.pop_front();
        Ok(true)
    }

    /// Pending operations in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedOperation> {
        self.pending.iter()
    }

    /// Returns true if any pending operation matches `f`.
    pub fn any(&self, f: impl Fn(&OpPayload) -> bool) -> bool {
        self.pending.iter().any(|op| f(&op.payload))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending operation and deletes the file.
    pub fn purge(&mut self) -> Result<()> {
        jsonl::remove(&self.path)?;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
