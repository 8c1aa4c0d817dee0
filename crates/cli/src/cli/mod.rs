// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{GlobalArgs, OutputFormat};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "pushsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep a device's push notification registration and interests in sync")]
#[command(
    long_about = "Keep a device's push notification registration and interests in sync.\n\n\
    Changes are recorded locally and queued; queued operations are sent to the registry in \
    order and survive restarts until they are confirmed."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a pushsync.toml for the current directory
    #[command(after_help = "\
Examples:
  pushsync -i my-instance init                       Write ./pushsync.toml
  pushsync -i my-instance --state-dir .state init    Keep state next to the config
  pushsync -c other.toml -i my-instance init --force Overwrite an existing file")]
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Register the device with a push token
    #[command(after_help = "\
Examples:
  pushsync -i my-instance start --token fcm-token    Register and wait up to 10s
  pushsync start --token fcm-token --wait 0          Queue registration and exit")]
    Start {
        /// Push token issued by the platform
        #[arg(long, value_parser = non_empty_string)]
        token: String,
    },

    /// Subscribe to one or more interests
    Subscribe {
        #[arg(required = true, value_name = "interest")]
        interests: Vec<String>,
    },

    /// Unsubscribe from one or more interests
    Unsubscribe {
        #[arg(required = true, value_name = "interest")]
        interests: Vec<String>,
    },

    /// Replace all interests (no arguments clears them)
    SetSubscriptions {
        #[arg(value_name = "interest")]
        interests: Vec<String>,
    },

    /// List the device's interests
    Interests,

    /// Associate the device with a user
    SetUser {
        #[arg(value_parser = non_empty_string)]
        user_id: String,

        /// JWT authorizing the association
        #[arg(long, value_parser = non_empty_string)]
        auth_token: String,
    },

    /// Send a new push token for the device
    RefreshToken {
        #[arg(value_parser = non_empty_string)]
        token: String,
    },

    /// Report a notification event
    Report {
        #[arg(value_enum)]
        event: ReportKind,

        /// Publish id of the notification
        #[arg(value_parser = non_empty_string)]
        publish_id: String,

        /// Delivery only: the app was in the background
        #[arg(long)]
        background: bool,

        /// Delivery only: the notification had something to display
        #[arg(long)]
        displayable: bool,

        /// Delivery only: the notification carried a data payload
        #[arg(long)]
        data: bool,
    },

    /// Show device id, user, interests and queued operations
    Status,

    /// Wait for queued operations to reach the registry
    Drain,

    /// Delete all local state for the instance
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Open,
    Delivery,
}

impl Command {
    /// Returns true for commands that queue work for the registry.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Start { .. }
                | Command::Subscribe { .. }
                | Command::Unsubscribe { .. }
                | Command::SetSubscriptions { .. }
                | Command::SetUser { .. }
                | Command::RefreshToken { .. }
        )
    }
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
