// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use pushsync::Config;

use crate::cli::GlobalArgs;
use crate::config::{absolute, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};

/// Writes a config file built from the global flags.
///
/// The file goes to `--config` when given, else `pushsync.toml` in `cwd`.
/// An existing file is only replaced with `force`.
pub fn run(args: &GlobalArgs, force: bool, cwd: &Path, out: &mut dyn Write) -> Result<()> {
    let path = match &args.config {
        Some(path) => absolute(path, cwd),
        None => cwd.join(DEFAULT_CONFIG_FILE),
    };
    if path.exists() && !force {
        return Err(Error::AlreadyInitialized(path.display().to_string()));
    }

    let instance_id = args.instance_id.as_deref().ok_or(Error::MissingInstanceId)?;
    let mut config = Config::new(instance_id);
    config.state_dir = args.state_dir.as_deref().map(|dir| absolute(dir, cwd));
    config.base_url.clone_from(&args.base_url);
    config.validate()?;
    config.save(&path)?;

    writeln!(out, "Wrote {}", path.display())?;
    writeln!(out, "Instance: {}", config.instance_id)?;
    if let Some(dir) = &config.state_dir {
        writeln!(out, "State:    {}", dir.display())?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
