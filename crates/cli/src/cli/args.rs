// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Arguments shared by every command.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

/// Output format for commands that print state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to ./pushsync.toml when present)
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Registry instance id
    #[arg(short, long, global = true, value_name = "id")]
    pub instance_id: Option<String>,

    /// Directory holding device state and the operation queue
    #[arg(long, global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    /// Registry base URL
    #[arg(long, global = true, value_name = "url")]
    pub base_url: Option<String>,

    /// Seconds to wait for queued operations to reach the registry
    #[arg(short, long, global = true, default_value_t = 10, value_name = "secs")]
    pub wait: u64,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t)]
    pub output: OutputFormat,
}
