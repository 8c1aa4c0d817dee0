// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Interest names and interest sets.
//!
//! The registry enforces the same limits; checking them locally lets callers
//! fail fast instead of queueing an operation that can never succeed.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Maximum length of a single interest name.
pub const MAX_INTEREST_LENGTH: usize = 164;

/// Maximum number of interests a single device may subscribe to.
pub const MAX_INTERESTS: usize = 5000;

/// A device's subscribed interests, ordered for stable serialization.
pub type InterestSet = BTreeSet<String>;

static INTEREST_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"^[a-zA-Z0-9_\-=@,.;]{1,164}$") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

/// Validates a single interest name.
pub fn validate_interest(interest: &str) -> Result<()> {
    if INTEREST_RE.is_match(interest) {
        Ok(())
    } else {
        Err(Error::InvalidInterest(interest.to_string()))
    }
}

/// Validates every member of a set along with the set size.
pub fn validate_interests(interests: &InterestSet) -> Result<()> {
    if interests.len() > MAX_INTERESTS {
        return Err(Error::TooManyInterests {
            count: interests.len(),
            max: MAX_INTERESTS,
        });
    }
    interests.iter().try_for_each(|i| validate_interest(i))
}

/// Checks that adding one more interest keeps the set within the cap.
pub fn ensure_capacity(interests: &InterestSet) -> Result<()> {
    if interests.len() >= MAX_INTERESTS {
        return Err(Error::TooManyInterests {
            count: interests.len() + 1,
            max: MAX_INTERESTS,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "interest_tests.rs"]
mod tests;
