// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use serde::Serialize;

use pushsync::{HttpReporter, QueuedOperation, ReportEvent};

use super::Context;
use crate::cli::{OutputFormat, ReportKind};
use crate::error::{Error, Result};

pub async fn start(ctx: &Context<'_>, token: &str, out: &mut dyn Write) -> Result<()> {
    let registration = ctx.coordinator.start(token)?;
    match registration.wait_timeout(ctx.wait).await? {
        Some(device_id) => writeln!(out, "Registered as {}", device_id)?,
        None => writeln!(out, "Registration queued")?,
    }
    Ok(())
}

pub fn refresh_token(ctx: &Context<'_>, token: &str, out: &mut dyn Write) -> Result<()> {
    ctx.coordinator.on_new_token(token)?;
    writeln!(out, "Token updated")?;
    Ok(())
}

/// Snapshot printed by `pushsync status`.
#[derive(Debug, Serialize)]
pub struct Status {
    pub instance_id: String,
    pub state_dir: String,
    pub device_id: Option<String>,
    pub user_id: Option<String>,
    pub interests: Vec<String>,
    pub pending: Vec<QueuedOperation>,
}

pub(crate) fn collect_status(ctx: &Context<'_>) -> Result<Status> {
    let c = ctx.coordinator;
    Ok(Status {
        instance_id: c.instance_id().to_string(),
        state_dir: c.state_dir().display().to_string(),
        device_id: c.device_id()?,
        user_id: c.user_id()?,
        interests: c.get_subscriptions()?.into_iter().collect(),
        pending: c.pending_operations()?,
    })
}

pub fn status(ctx: &Context<'_>, out: &mut dyn Write) -> Result<()> {
    let status = collect_status(ctx)?;
    if ctx.output == OutputFormat::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    writeln!(out, "Instance:  {}", status.instance_id)?;
    writeln!(out, "State dir: {}", status.state_dir)?;
    writeln!(
        out,
        "Device:    {}",
        status.device_id.as_deref().unwrap_or("(not registered)")
    )?;
    if let Some(user_id) = &status.user_id {
        writeln!(out, "User:      {}", user_id)?;
    }
    writeln!(out, "Interests: {}", status.interests.len())?;
    if status.pending.is_empty() {
        writeln!(out, "Queue:     empty")?;
    } else {
        writeln!(out, "Queue:")?;
        for op in &status.pending {
            writeln!(
                out,
                "  {:>4}  {:<17}  {}",
                op.seq,
                op.payload.kind(),
                op.created_at.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
    }
    Ok(())
}

pub fn clear(ctx: &Context<'_>, out: &mut dyn Write) -> Result<()> {
    if ctx.coordinator.clear()? {
        writeln!(out, "Cleared local state for {}", ctx.coordinator.instance_id())?;
    } else {
        writeln!(out, "Nothing to clear")?;
    }
    Ok(())
}

/// Delivery details; ignored for open events.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryFlags {
    pub background: bool,
    pub displayable: bool,
    pub data: bool,
}

pub async fn report(
    ctx: &Context<'_>,
    kind: ReportKind,
    publish_id: &str,
    flags: DeliveryFlags,
    out: &mut dyn Write,
) -> Result<()> {
    let device_id = ctx.coordinator.device_id()?.ok_or(Error::NotRegistered)?;
    let event = match kind {
        ReportKind::Open => ReportEvent::open(device_id, publish_id),
        ReportKind::Delivery => ReportEvent::delivery(
            device_id,
            publish_id,
            flags.background,
            flags.displayable,
            flags.data,
        ),
    };

    let config = ctx.config;
    let reporter = HttpReporter::new(
        &config.instance_id,
        config.reporting_url.as_deref(),
        config.request_timeout(),
    )?;
    // Failures are logged by the reporter; only a hung request is cut short.
    let _ = tokio::time::timeout(ctx.wait, reporter.report(event)).await;
    writeln!(out, "Reported {} for {}", publish_id, ctx.coordinator.instance_id())?;
    Ok(())
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
