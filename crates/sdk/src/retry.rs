// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry with bounded exponential backoff.
//!
//! The executor knows nothing about what it retries. Failures classify
//! themselves through [`Classify`], and the [`RetryPolicy`] decides which
//! classes are worth another attempt. Dropping the future returned by
//! [`RetryStrategy::retry`] abandons any pending sleep, which is how the
//! queue worker is cancelled.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

/// Upper bound on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(64_000);

/// Whether a failure may succeed if the same request is sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Timeouts, connection failures, throttling and server errors.
    Retryable,
    /// The request itself is wrong; sending it again cannot help.
    Permanent,
}

/// Implemented by errors the retry executor can classify.
pub trait Classify {
    fn retry_class(&self) -> RetryClass;
}

/// Exponential backoff: `min(max, base * 2^(attempt - 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Backoff { base, max }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

/// Which failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Retry every failure until the operation succeeds or is cancelled.
    Forever,
    /// Retry retryable failures; return permanent ones to the caller.
    #[default]
    UntilPermanent,
    /// Like `UntilPermanent`, but give up after `max_attempts` attempts.
    Limited { max_attempts: u32 },
}

impl RetryPolicy {
    fn should_retry(&self, class: RetryClass, attempt: u32) -> bool {
        match self {
            RetryPolicy::Forever => true,
            RetryPolicy::UntilPermanent => class == RetryClass::Retryable,
            RetryPolicy::Limited { max_attempts } => {
                class == RetryClass::Retryable && attempt < *max_attempts
            }
        }
    }
}

/// Backoff schedule plus policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStrategy {
    pub backoff: Backoff,
    pub policy: RetryPolicy,
}

impl RetryStrategy {
    pub fn new(backoff: Backoff, policy: RetryPolicy) -> Self {
        RetryStrategy { backoff, policy }
    }

    /// Runs `operation` until it succeeds or the policy gives up.
    ///
    /// Returns the last error when the policy stops retrying. With
    /// [`RetryPolicy::Forever`] this only returns on success.
    pub async fn retry<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let class = err.retry_class();
            if !self.policy.should_retry(class, attempt) {
                tracing::debug!(attempt, ?class, "giving up: {}", err);
                return Err(err);
            }

            let delay = self.backoff.delay(attempt);
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "attempt failed, retrying: {}",
                err
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
