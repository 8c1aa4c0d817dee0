// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::Context;
use crate::error::{Error, Result};

/// Associates the device with `user_id`.
///
/// Every run is a fresh handle, so the device is resumed with its saved push
/// token first. The auth token is wired into the coordinator when it is
/// built.
pub async fn set_user(ctx: &Context<'_>, user_id: &str, out: &mut dyn Write) -> Result<()> {
    let registration = ctx.coordinator.resume()?.ok_or(Error::NotStarted)?;
    if registration.wait_timeout(ctx.wait).await?.is_none() {
        return Err(Error::NotRegistered);
    }
    ctx.coordinator.set_user_id(user_id)?;
    writeln!(out, "Associated with user {}", user_id)?;
    Ok(())
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
