// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the client config from flags and an optional config file.

use std::path::{Path, PathBuf};

use pushsync::Config;

use crate::cli::GlobalArgs;
use crate::error::{Error, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pushsync.toml";

/// Loads the config file, if any, and applies flag overrides on top.
///
/// `cwd` is where the default config file is looked for.
pub fn resolve(args: &GlobalArgs, cwd: &Path) -> Result<Config> {
    let file = match &args.config {
        Some(path) => Some(absolute(path, cwd)),
        None => Some(cwd.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };

    let mut config = match (file, &args.instance_id) {
        (Some(path), _) => Config::load(&path)?,
        (None, Some(id)) => Config::new(id.as_str()),
        (None, None) => return Err(Error::MissingInstanceId),
    };

    if let Some(id) = &args.instance_id {
        config.instance_id.clone_from(id);
    }
    if let Some(dir) = &args.state_dir {
        config.state_dir = Some(absolute(dir, cwd));
    }
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

pub(crate) fn absolute(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
