// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pushsync_cli - command line front end for the pushsync client.
//!
//! Each invocation opens the instance's local state, applies one command
//! through a [`pushsync::SyncCoordinator`], waits up to `--wait` seconds for
//! queued operations to reach the registry, and exits. Anything not yet sent
//! stays queued for the next run.

mod cli;
mod commands;

pub mod config;
pub mod error;

pub use cli::{Cli, Command, GlobalArgs, OutputFormat, ReportKind};
pub use error::{Error, Result};

use std::sync::Arc;
use std::time::Duration;

use pushsync::{StaticTokenProvider, SyncCoordinatorBuilder};

use commands::Context;

/// Runs a parsed command line to completion.
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    if let Command::Init { force } = cli.command {
        let mut stdout = std::io::stdout().lock();
        return commands::init::run(&cli.global, force, &cwd, &mut stdout);
    }
    let config = config::resolve(&cli.global, &cwd)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    let mut builder =
        SyncCoordinatorBuilder::from_config(&config)?.runtime(runtime.handle().clone());
    if let Command::SetUser { auth_token, .. } = &cli.command {
        builder = builder.token_provider(Arc::new(StaticTokenProvider::new(auth_token.as_str())));
    }
    let coordinator = builder.build()?;
    tracing::debug!(
        instance_id = coordinator.instance_id(),
        state_dir = %coordinator.state_dir().display(),
        "opened instance"
    );

    let ctx = Context {
        coordinator: &coordinator,
        config: &config,
        wait: Duration::from_secs(cli.global.wait),
        output: cli.global.output,
    };
    let mut stdout = std::io::stdout().lock();
    let result = runtime.block_on(commands::execute(&ctx, cli.command, &mut stdout));

    coordinator.shutdown();
    result
}
