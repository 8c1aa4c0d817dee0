// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Context;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn subscribe(ctx: &Context<'_>, interests: &[String], out: &mut dyn Write) -> Result<()> {
    for interest in interests {
        ctx.coordinator.subscribe(interest)?;
        writeln!(out, "Subscribed to {}", interest)?;
    }
    Ok(())
}

pub fn unsubscribe(ctx: &Context<'_>, interests: &[String], out: &mut dyn Write) -> Result<()> {
    for interest in interests {
        ctx.coordinator.unsubscribe(interest)?;
        writeln!(out, "Unsubscribed from {}", interest)?;
    }
    Ok(())
}

pub fn set_subscriptions(
    ctx: &Context<'_>,
    interests: Vec<String>,
    out: &mut dyn Write,
) -> Result<()> {
    let count = interests.len();
    ctx.coordinator.set_subscriptions(interests)?;
    writeln!(out, "Interests set ({})", count)?;
    Ok(())
}

pub fn list(ctx: &Context<'_>, out: &mut dyn Write) -> Result<()> {
    let interests = ctx.coordinator.get_subscriptions()?;
    match ctx.output {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&interests)?)?,
        OutputFormat::Text => {
            for interest in &interests {
                writeln!(out, "{}", interest)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "subscriptions_tests.rs"]
mod tests;
