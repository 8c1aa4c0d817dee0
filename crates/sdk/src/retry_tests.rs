// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use yare::parameterized;

#[derive(Debug)]
struct Failure(RetryClass);

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} failure", self.0)
    }
}

impl Classify for Failure {
    fn retry_class(&self) -> RetryClass {
        self.0
    }
}

#[parameterized(
    first = { 1, 200 },
    second = { 2, 400 },
    third = { 3, 800 },
    ninth = { 9, 51_200 },
    capped = { 10, 64_000 },
    far_past_cap = { 40, 64_000 },
)]
fn default_backoff_delays(attempt: u32, expected_ms: u64) {
    assert_eq!(
        Backoff::default().delay(attempt),
        Duration::from_millis(expected_ms)
    );
}

#[test]
fn backoff_is_monotonic_and_bounded() {
    let backoff = Backoff::default();
    let delays: Vec<Duration> = (1..=10).map(|n| backoff.delay(n)).collect();

    assert_eq!(delays[0], Duration::from_millis(200));
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| *d <= DEFAULT_MAX_DELAY));
}

#[test]
fn attempt_zero_is_treated_as_first() {
    assert_eq!(Backoff::default().delay(0), DEFAULT_BASE_DELAY);
}

#[parameterized(
    forever_retryable = { RetryPolicy::Forever, RetryClass::Retryable, 100, true },
    forever_permanent = { RetryPolicy::Forever, RetryClass::Permanent, 100, true },
    until_retryable = { RetryPolicy::UntilPermanent, RetryClass::Retryable, 100, true },
    until_permanent = { RetryPolicy::UntilPermanent, RetryClass::Permanent, 1, false },
    limited_below = { RetryPolicy::Limited { max_attempts: 3 }, RetryClass::Retryable, 2, true },
    limited_reached = { RetryPolicy::Limited { max_attempts: 3 }, RetryClass::Retryable, 3, false },
    limited_permanent = { RetryPolicy::Limited { max_attempts: 3 }, RetryClass::Permanent, 1, false },
)]
fn policy_decisions(policy: RetryPolicy, class: RetryClass, attempt: u32, expected: bool) {
    assert_eq!(policy.should_retry(class, attempt), expected);
}

#[tokio::test(start_paused = true)]
async fn retries_until_success_with_backoff() {
    let calls = AtomicU32::new(0);
    let started = tokio::time::Instant::now();

    let result = RetryStrategy::default()
        .retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(Failure(RetryClass::Retryable))
            } else {
                Ok(n)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_returns_immediately() {
    let calls = AtomicU32::new(0);

    let result: Result<(), Failure> = RetryStrategy::default()
        .retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Failure(RetryClass::Permanent))
        })
        .await;

    assert_eq!(result.unwrap_err().0, RetryClass::Permanent);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn forever_retries_permanent_failures() {
    let calls = AtomicU32::new(0);
    let strategy = RetryStrategy::new(Backoff::default(), RetryPolicy::Forever);

    let result = strategy
        .retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 4 {
                Err(Failure(RetryClass::Permanent))
            } else {
                Ok(())
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn limited_gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let strategy = RetryStrategy::new(
        Backoff::default(),
        RetryPolicy::Limited { max_attempts: 3 },
    );

    let result: Result<(), Failure> = strategy
        .retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Failure(RetryClass::Retryable))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_future_abandons_the_sleep() {
    let calls = AtomicU32::new(0);
    let strategy = RetryStrategy::new(Backoff::default(), RetryPolicy::Forever);

    let outcome = tokio::time::timeout(
        Duration::from_millis(250),
        strategy.retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Failure(RetryClass::Retryable))
        }),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
