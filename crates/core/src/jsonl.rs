// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable JSON file helpers.
//!
//! Append-only JSONL files carry the operation queue; single JSON documents
//! carry device state. Appends are fsynced, and full rewrites go through a
//! temporary file plus rename so a crash leaves either the old or the new
//! content, never a mix.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Reads all records from a JSONL file.
///
/// Skips empty lines and returns an empty vec if the file doesn't exist.
/// A malformed final line is a write torn by a crash and is dropped; a
/// malformed line anywhere else is reported as corruption.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    read_log(path).map(|(records, _)| records)
}

/// Like [`read_all`], but also reports whether the file ends in a torn
/// write: a dropped trailing record or a missing final newline.
///
/// A torn file must be rewritten before anything is appended to it, or the
/// next record would be glued onto the partial line.
pub fn read_log<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, bool)> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), false)),
        Err(e) => return Err(e.into()),
    };

    let lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    let last = lines.iter().rposition(|l| !is_blank(l));
    let mut torn = !bytes.is_empty() && !bytes.ends_with(b"\n");

    let mut records = Vec::new();
    for (n, line) in lines.iter().enumerate() {
        if is_blank(line) {
            continue;
        }
        match serde_json::from_slice(line) {
            Ok(record) => records.push(record),
            Err(e) if Some(n) == last => {
                tracing::warn!(path = %path.display(), "dropping torn trailing record: {}", e);
                torn = true;
            }
            Err(e) => {
                return Err(Error::CorruptedData(format!(
                    "{} line {}: {}",
                    path.display(),
                    n + 1,
                    e
                )))
            }
        }
    }

    Ok((records, torn))
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Replaces a JSONL file with `records`.
///
/// Used for rewriting the queue after an item is confirmed.
pub fn write_all<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    replace(path, &buf)
}

/// Reads a single JSON document, returning `None` if the file doesn't exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomically replaces a single JSON document.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let buf = serde_json::to_vec_pretty(value)?;
    replace(path, &buf)
}

/// Removes a file, returning whether it existed.
pub fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn replace(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
