// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Public handle for keeping one device in sync with the registry.
//!
//! Any number of [`SyncCoordinator`] handles may be created for the same
//! instance. They hold no device state of their own: every call goes
//! through the instance's shared scope, where local changes and queued
//! operations are recorded together under one lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use ps_core::device::{validate_user_id, DeviceMetadata};
use ps_core::interest::{ensure_capacity, validate_interest, validate_interests};
use ps_core::{InstancePaths, InterestSet, OpPayload, QueuedOperation};

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::registry::{HttpRegistry, Registry};
use crate::retry::RetryStrategy;
use crate::scope::{LocalState, RegistrationStatus, Scope};

/// Immutable configuration shared by a handle and the worker it spawns.
pub(crate) struct Settings {
    pub(crate) paths: InstancePaths,
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) token_provider: Option<Arc<dyn TokenProvider>>,
    pub(crate) retry: RetryStrategy,
    pub(crate) metadata: DeviceMetadata,
    pub(crate) runtime: Handle,
}

/// Metadata describing this library and the host it runs on.
pub fn default_metadata() -> DeviceMetadata {
    DeviceMetadata::new(
        env!("CARGO_PKG_VERSION"),
        format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
    )
}

/// Builder for [`SyncCoordinator`].
pub struct SyncCoordinatorBuilder {
    instance_id: String,
    state_dir: Option<PathBuf>,
    registry: Option<Arc<dyn Registry>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    retry: RetryStrategy,
    metadata: Option<DeviceMetadata>,
    runtime: Option<Handle>,
}

impl SyncCoordinatorBuilder {
    pub fn new(instance_id: impl Into<String>) -> Self {
        SyncCoordinatorBuilder {
            instance_id: instance_id.into(),
            state_dir: None,
            registry: None,
            token_provider: None,
            retry: RetryStrategy::default(),
            metadata: None,
            runtime: None,
        }
    }

    /// Starts from a loaded config, using the HTTP registry it describes.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let registry = HttpRegistry::new(
            &config.instance_id,
            config.base_url.as_deref(),
            config.request_timeout(),
        )?;
        Ok(SyncCoordinatorBuilder::new(config.instance_id.clone())
            .state_dir(config.state_dir())
            .registry(Arc::new(registry))
            .retry(config.retry.strategy()?))
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Supplies the JWTs needed by [`SyncCoordinator::set_user_id`].
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    pub fn metadata(mut self, metadata: DeviceMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Runtime the queue worker runs on. Defaults to the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<SyncCoordinator> {
        let registry = self
            .registry
            .ok_or_else(|| Error::Config("no registry configured".into()))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|_| Error::Config("no tokio runtime available".into()))?,
        };
        let dir = self
            .state_dir
            .unwrap_or_else(|| Config::new(self.instance_id.as_str()).state_dir());
        let paths = InstancePaths::new(canonical_dir(&dir)?, &self.instance_id)?;

        let settings = Settings {
            paths,
            registry,
            token_provider: self.token_provider,
            retry: self.retry,
            metadata: self.metadata.unwrap_or_else(default_metadata),
            runtime,
        };
        Ok(SyncCoordinator {
            settings: Arc::new(settings),
            started: AtomicBool::new(false),
        })
    }
}

/// Creates the directory and resolves it so that every spelling of the same
/// directory maps to one scope.
fn canonical_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::Persistence(e.into()))?;
    dir.canonicalize().map_err(|e| Error::Persistence(e.into()))
}

/// Awaits the outcome of the device's registration.
///
/// Dropping it does not stop the registration.
#[derive(Debug)]
pub struct Registration {
    status: watch::Receiver<RegistrationStatus>,
    stopped: CancellationToken,
}

impl Registration {
    /// Current status without waiting.
    pub fn status(&self) -> RegistrationStatus {
        self.status.borrow().clone()
    }

    /// Waits until the registry assigned a device id, returning it.
    pub async fn wait(mut self) -> Result<String> {
        let stopped = self.stopped.clone();
        let status = tokio::select! {
            _ = stopped.cancelled() => return Err(Error::Stopped),
            status = self.status.wait_for(|s| *s != RegistrationStatus::Pending) => {
                status.map_err(|_| Error::Stopped)?.clone()
            }
        };
        match status {
            RegistrationStatus::Registered(device_id) => Ok(device_id),
            RegistrationStatus::Failed(reason) => Err(Error::Registration(reason)),
            RegistrationStatus::Pending => Err(Error::Stopped),
        }
    }

    /// Like [`Registration::wait`], giving up after `timeout`.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Handle keeping one device's registration and interests in sync.
pub struct SyncCoordinator {
    settings: Arc<Settings>,
    started: AtomicBool,
}

impl SyncCoordinator {
    pub fn builder(instance_id: impl Into<String>) -> SyncCoordinatorBuilder {
        SyncCoordinatorBuilder::new(instance_id)
    }

    pub fn instance_id(&self) -> &str {
        self.settings.paths.instance_id()
    }

    pub fn state_dir(&self) -> &Path {
        self.settings.paths.dir()
    }

    fn scope(&self) -> Result<Arc<Scope>> {
        Scope::acquire(&self.settings)
    }

    /// Starts syncing with push token `token`.
    ///
    /// Queues the registration unless the device is registered or a
    /// registration is already queued, in which case only a changed token or
    /// changed metadata is sent. Interests set before the first start are
    /// sent right after registration.
    pub fn start(&self, token: &str) -> Result<Registration> {
        validate_token(token)?;
        let metadata = &self.settings.metadata;
        let scope = self.scope()?;

        scope.submit(|local| {
            if local.is_started() {
                if local.store.token() != Some(token) {
                    local
                        .queue
                        .push(OpPayload::refresh_token(token.to_string()))?;
                    tracing::debug!("token refresh queued");
                }
                if local.store.metadata() != Some(metadata) {
                    local
                        .queue
                        .push(OpPayload::set_metadata(metadata.clone()))?;
                }
                local.store.set_session(token.to_string(), metadata.clone())?;
                return Ok(());
            }

            let register = OpPayload::register(
                token.to_string(),
                local.store.previous_device_ids().to_vec(),
                metadata.clone(),
            );
            local.queue.push(register)?;
            if !local.store.interests().is_empty() {
                let interests = local.store.interests().clone();
                local.queue.push(OpPayload::set_subscriptions(interests))?;
            }
            if let Some(user_id) = local.store.user_id() {
                let op = OpPayload::set_user_id(user_id.to_string());
                local.queue.push(op)?;
            }
            local.store.set_session(token.to_string(), metadata.clone())?;
            scope.set_registration(RegistrationStatus::Pending);
            tracing::info!(instance_id = self.instance_id(), "registration queued");
            Ok(())
        })?;

        self.started.store(true, Ordering::Release);
        Ok(Registration {
            status: scope.registration(),
            stopped: scope.cancel_token(),
        })
    }

    /// Starts with the push token saved by an earlier [`start`](Self::start)
    /// or [`on_new_token`](Self::on_new_token).
    ///
    /// Returns `None` if no token was ever saved.
    pub fn resume(&self) -> Result<Option<Registration>> {
        let token = self
            .scope()?
            .read(|local| local.store.token().map(str::to_string))?;
        token.map(|token| self.start(&token)).transpose()
    }

    /// Records a new push token issued by the platform.
    ///
    /// Before start the token is only remembered; afterwards it is sent to
    /// the registry.
    pub fn on_new_token(&self, token: &str) -> Result<()> {
        validate_token(token)?;
        self.scope()?.submit(|local| {
            if local.is_started() {
                queue_token(local, token)
            } else {
                local.store.set_token(Some(token.to_string()))?;
                Ok(())
            }
        })
    }

    /// Adds `interest` to the device's interests.
    pub fn subscribe(&self, interest: &str) -> Result<()> {
        validate_interest(interest)?;
        self.scope()?.submit(|local| {
            if local.store.interests().contains(interest) {
                return Ok(());
            }
            ensure_capacity(local.store.interests())?;

            let mut interests = local.store.interests().clone();
            interests.insert(interest.to_string());
            if local.is_started() {
                local.queue.push(OpPayload::subscribe(interest.to_string()))?;
            }
            local.store.set_interests(interests)?;
            tracing::debug!(interest, "subscribed");
            Ok(())
        })
    }

    /// Removes `interest` from the device's interests.
    pub fn unsubscribe(&self, interest: &str) -> Result<()> {
        validate_interest(interest)?;
        self.scope()?.submit(|local| {
            if !local.store.interests().contains(interest) {
                return Ok(());
            }

            let mut interests = local.store.interests().clone();
            interests.remove(interest);
            if local.is_started() {
                local
                    .queue
                    .push(OpPayload::unsubscribe(interest.to_string()))?;
            }
            local.store.set_interests(interests)?;
            tracing::debug!(interest, "unsubscribed");
            Ok(())
        })
    }

    /// Replaces the device's interests with `interests`.
    pub fn set_subscriptions<I, S>(&self, interests: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let interests: InterestSet = interests.into_iter().map(Into::into).collect();
        validate_interests(&interests)?;
        self.scope()?.submit(|local| {
            if local.store.interests() == &interests {
                return Ok(());
            }
            if local.is_started() {
                local
                    .queue
                    .push(OpPayload::set_subscriptions(interests.clone()))?;
            }
            tracing::debug!(count = interests.len(), "replaced interests");
            local.store.set_interests(interests)?;
            Ok(())
        })
    }

    /// The local view of the device's interests. Never waits on the network.
    pub fn get_subscriptions(&self) -> Result<InterestSet> {
        self.scope()?.read(|local| local.store.interests().clone())
    }

    /// Associates the device with `user_id`.
    ///
    /// Requires that this handle called [`start`](Self::start) and that the
    /// device is registered. A device is associated with at most one user;
    /// asking for the same user again is a no-op.
    pub fn set_user_id(&self, user_id: &str) -> Result<()> {
        validate_user_id(user_id)?;
        if !self.started.load(Ordering::Acquire) {
            return Err(Error::Precondition(
                "start must be called on this handle before set_user_id".into(),
            ));
        }
        if self.settings.token_provider.is_none() {
            return Err(Error::Precondition(
                "set_user_id requires a token provider".into(),
            ));
        }

        self.scope()?.submit(|local| {
            if local.store.device_id().is_none() {
                return Err(Error::Precondition(
                    "device is not registered yet; wait for start to complete".into(),
                ));
            }
            match local.store.user_id() {
                Some(existing) if existing == user_id => Ok(()),
                Some(existing) => Err(Error::Precondition(format!(
                    "device is already associated with user '{existing}'"
                ))),
                None => {
                    local
                        .queue
                        .push(OpPayload::set_user_id(user_id.to_string()))?;
                    local.store.set_user_id(Some(user_id.to_string()))?;
                    tracing::info!(user_id, "user association queued");
                    Ok(())
                }
            }
        })
    }

    pub fn device_id(&self) -> Result<Option<String>> {
        self.scope()?
            .read(|local| local.store.device_id().map(str::to_string))
    }

    pub fn user_id(&self) -> Result<Option<String>> {
        self.scope()?
            .read(|local| local.store.user_id().map(str::to_string))
    }

    /// Operations still waiting for the registry, oldest first.
    pub fn pending_operations(&self) -> Result<Vec<QueuedOperation>> {
        self.scope()?
            .read(|local| local.queue.iter().cloned().collect())
    }

    /// Waits until every queued operation has been confirmed or dropped.
    pub async fn flushed(&self) -> Result<()> {
        let scope = self.scope()?;
        let mut pending = scope.pending();
        let stopped = scope.cancel_token();
        drop(scope);

        tokio::select! {
            _ = stopped.cancelled() => Err(Error::Stopped),
            drained = pending.wait_for(|n| *n == 0) => drained.map(|_| ()).map_err(|_| Error::Stopped),
        }
    }

    /// Stops the queue worker and releases the instance's files, keeping
    /// everything on disk. The next call on any handle reopens them.
    ///
    /// Returns false if the instance was not open.
    pub fn shutdown(&self) -> bool {
        let closed = Scope::release(&self.settings.paths);
        if closed {
            tracing::info!(instance_id = self.instance_id(), "instance shut down");
        }
        closed
    }

    /// Shuts down and deletes the device state and queue.
    ///
    /// Returns true if anything was removed.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.scope()?.mutate(|local| {
            let removed = local.store.clear()?;
            local.queue.purge()?;
            Ok(removed)
        })?;
        Scope::release(&self.settings.paths);
        self.started.store(false, Ordering::Release);
        tracing::info!(instance_id = self.instance_id(), removed, "instance cleared");
        Ok(removed)
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::Validation("push token must not be empty".into()));
    }
    Ok(())
}

/// Queues a token refresh when `token` differs from the stored one.
fn queue_token(local: &mut LocalState, token: &str) -> Result<()> {
    if local.store.token() == Some(token) {
        return Ok(());
    }
    local
        .queue
        .push(OpPayload::refresh_token(token.to_string()))?;
    local.store.set_token(Some(token.to_string()))?;
    tracing::debug!("token refresh queued");
    Ok(())
}
