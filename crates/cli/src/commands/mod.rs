// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod device;
pub mod init;
pub mod subscriptions;
pub mod user;

use std::io::Write;
use std::time::Duration;

use pushsync::{Config, SyncCoordinator};

use crate::cli::{Command, OutputFormat};
use crate::error::{Error, Result};

/// Everything a command needs besides its own arguments.
pub struct Context<'a> {
    pub coordinator: &'a SyncCoordinator,
    pub config: &'a Config,
    /// How long mutating commands wait for the queue to drain.
    pub wait: Duration,
    pub output: OutputFormat,
}

/// Runs one command, writing user-facing output to `out`.
pub async fn execute(ctx: &Context<'_>, command: Command, out: &mut dyn Write) -> Result<()> {
    let mutates = command.mutates();
    match command {
        Command::Init { .. } => return Err(Error::NeedsNoInstance("init")),
        Command::Start { token } => device::start(ctx, &token, out).await?,
        Command::Subscribe { interests } => subscriptions::subscribe(ctx, &interests, out)?,
        Command::Unsubscribe { interests } => subscriptions::unsubscribe(ctx, &interests, out)?,
        Command::SetSubscriptions { interests } => {
            subscriptions::set_subscriptions(ctx, interests, out)?
        }
        Command::Interests => subscriptions::list(ctx, out)?,
        Command::SetUser { user_id, .. } => user::set_user(ctx, &user_id, out).await?,
        Command::RefreshToken { token } => device::refresh_token(ctx, &token, out)?,
        Command::Report {
            event,
            publish_id,
            background,
            displayable,
            data,
        } => {
            let flags = device::DeliveryFlags {
                background,
                displayable,
                data,
            };
            device::report(ctx, event, &publish_id, flags, out).await?
        }
        Command::Status => device::status(ctx, out)?,
        Command::Drain => settle(ctx, out).await?,
        Command::Clear => device::clear(ctx, out)?,
    }
    if mutates {
        settle(ctx, out).await?;
    }
    Ok(())
}

/// Waits up to the configured time for queued operations to be sent, then
/// reports what is left.
pub async fn settle(ctx: &Context<'_>, out: &mut dyn Write) -> Result<()> {
    if let Ok(flushed) = tokio::time::timeout(ctx.wait, ctx.coordinator.flushed()).await {
        flushed?;
    }
    let pending = ctx.coordinator.pending_operations()?.len();
    if pending > 0 {
        writeln!(
            out,
            "{pending} operation(s) still queued; they will be sent on the next run"
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
