// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer tokens proving the app may associate a device with a user.

use crate::retry::{Classify, RetryClass};

/// Error returned by a [`TokenProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch token for user {user_id}: {reason}")]
pub struct TokenError {
    pub user_id: String,
    pub reason: String,
}

impl TokenError {
    pub fn new(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        TokenError {
            user_id: user_id.into(),
            reason: reason.into(),
        }
    }
}

impl Classify for TokenError {
    fn retry_class(&self) -> RetryClass {
        // Usually the app's own backend being unreachable.
        RetryClass::Retryable
    }
}

/// Supplies the JWT sent with a user association.
///
/// Implementations may block: the queue worker calls them on a blocking
/// thread.
pub trait TokenProvider: Send + Sync {
    fn fetch_token(&self, user_id: &str) -> Result<String, TokenError>;
}

/// Returns the same token for every user.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenProvider {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn fetch_token(&self, user_id: &str) -> Result<String, TokenError> {
        if self.token.is_empty() {
            return Err(TokenError::new(user_id, "no token configured"));
        }
        Ok(self.token.clone())
    }
}

impl<F> TokenProvider for F
where
    F: Fn(&str) -> Result<String, TokenError> + Send + Sync,
{
    fn fetch_token(&self, user_id: &str) -> Result<String, TokenError> {
        self(user_id)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
