// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored as TOML (conventionally `pushsync.toml`) and
//! includes:
//! - `instance_id`: the registry instance this installation belongs to
//! - `state_dir`: where device state and the operation queue are kept
//! - `[retry]`: backoff schedule and retry policy for queued operations

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::{Backoff, RetryPolicy, RetryStrategy};

/// Environment variable overriding the default state directory.
pub const STATE_DIR_ENV: &str = "PUSHSYNC_STATE_DIR";

const STATE_DIR_NAME: &str = "pushsync";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub instance_id: String,
    /// Directory for device state and queue files. Resolved through
    /// [`Config::state_dir`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Overrides the registry location, e.g. for a local test server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry policy names as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyName {
    Forever,
    #[default]
    UntilPermanent,
    Limited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default)]
    pub policy: PolicyName,
    /// Only used by the `limited` policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    64_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            policy: PolicyName::default(),
            max_attempts: None,
        }
    }
}

impl RetryConfig {
    /// Builds the strategy described by this section.
    pub fn strategy(&self) -> Result<RetryStrategy> {
        if self.base_delay_ms == 0 {
            return Err(Error::Config("retry.base_delay_ms must be positive".into()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::Config(
                "retry.max_delay_ms must not be below retry.base_delay_ms".into(),
            ));
        }
        let policy = match (self.policy, self.max_attempts) {
            (PolicyName::Forever, _) => RetryPolicy::Forever,
            (PolicyName::UntilPermanent, _) => RetryPolicy::UntilPermanent,
            (PolicyName::Limited, Some(max_attempts)) if max_attempts > 0 => {
                RetryPolicy::Limited { max_attempts }
            }
            (PolicyName::Limited, _) => {
                return Err(Error::Config(
                    "retry.max_attempts must be set to a positive number for the limited policy"
                        .into(),
                ))
            }
        };
        let backoff = Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        );
        Ok(RetryStrategy::new(backoff, policy))
    }
}

impl Config {
    /// Creates a config with defaults for everything but the instance id.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Config {
            instance_id: instance_id.into(),
            state_dir: None,
            base_url: None,
            reporting_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses and validates TOML config text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.instance_id.trim().is_empty() {
            return Err(Error::Config("instance_id must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        self.retry.strategy().map(|_| ())
    }

    /// The configured state directory, else `$PUSHSYNC_STATE_DIR`, else the
    /// platform's local data directory.
    pub fn state_dir(&self) -> PathBuf {
        resolve_state_dir(
            self.state_dir.as_deref(),
            std::env::var_os(STATE_DIR_ENV).map(PathBuf::from),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn resolve_state_dir(configured: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    if let Some(dir) = from_env.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    dirs::data_local_dir()
        .map(|d| d.join(STATE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(STATE_DIR_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
