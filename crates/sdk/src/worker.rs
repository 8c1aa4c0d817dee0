// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background task draining an instance's operation queue.
//!
//! The worker takes the oldest queued operation, sends it through the
//! retry strategy, and commits the outcome to local state before looking
//! at the next one. It is the only writer of remote-visible state, so the
//! registry sees operations in exactly the order they were queued.

use std::sync::Arc;

use ps_core::{replay, DeviceIdentity, OpPayload};

use crate::auth::TokenError;
use crate::coordinator::Settings;
use crate::error::{Error, Result};
use crate::registry::{RegisterDeviceResult, RegistryError};
use crate::retry::{Classify, RetryClass};
use crate::scope::{LocalState, RegistrationStatus, Scope};

/// The queue head as seen when it was taken.
#[derive(Debug, Clone)]
struct Job {
    seq: u64,
    payload: OpPayload,
    device_id: Option<String>,
}

#[derive(Debug)]
enum Outcome {
    Registered(RegisterDeviceResult),
    Done,
}

#[derive(Debug, thiserror::Error)]
enum JobError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("no device id stored")]
    Unregistered,

    #[error("no token provider configured")]
    NoTokenProvider,
}

impl Classify for JobError {
    fn retry_class(&self) -> RetryClass {
        match self {
            JobError::Registry(e) => e.retry_class(),
            JobError::Token(e) => e.retry_class(),
            JobError::Unregistered | JobError::NoTokenProvider => RetryClass::Permanent,
        }
    }
}

/// Drains the queue until the scope is closed.
pub(crate) async fn run(scope: Arc<Scope>, settings: Arc<Settings>) {
    let cancel = scope.cancel_token();
    let mut commit_failures = 0u32;

    loop {
        let job = match next_job(&scope) {
            Ok(Some(job)) => job,
            Ok(None) => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = scope.woken() => continue,
                }
            }
            Err(_) => break,
        };
        tracing::debug!(seq = job.seq, kind = job.payload.kind(), "sending operation");

        let result = match unrunnable(&settings, &job) {
            Some(err) => Err(err),
            None => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = settings.retry.retry(|| execute(&settings, &job)) => result,
                }
            }
        };

        match commit(&scope, &settings, &job, result) {
            Ok(()) => commit_failures = 0,
            Err(Error::Stopped) => break,
            Err(e) => {
                commit_failures = commit_failures.saturating_add(1);
                let delay = settings.retry.backoff.delay(commit_failures);
                tracing::error!(
                    seq = job.seq,
                    kind = job.payload.kind(),
                    "failed to record result, operation stays queued: {}",
                    e
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::debug!(instance_id = scope.instance_id(), "worker stopped");
}

fn next_job(scope: &Scope) -> Result<Option<Job>> {
    scope.read(|local| {
        local.queue.front().map(|op| Job {
            seq: op.seq,
            payload: op.payload.clone(),
            device_id: local.store.device_id().map(str::to_string),
        })
    })
}

/// Failures known before anything is sent. These are never retried.
fn unrunnable(settings: &Settings, job: &Job) -> Option<JobError> {
    if job.payload.requires_device_id() && job.device_id.is_none() {
        return Some(JobError::Unregistered);
    }
    if matches!(job.payload, OpPayload::SetUserId { .. }) && settings.token_provider.is_none() {
        return Some(JobError::NoTokenProvider);
    }
    None
}

async fn execute(settings: &Settings, job: &Job) -> std::result::Result<Outcome, JobError> {
    let registry = settings.registry.as_ref();
    let device = || job.device_id.as_deref().ok_or(JobError::Unregistered);

    match &job.payload {
        OpPayload::Register {
            token,
            known_previous_device_ids,
            metadata,
        } => {
            let registered = registry
                .register(token, known_previous_device_ids, metadata)
                .await?;
            return Ok(Outcome::Registered(registered));
        }
        OpPayload::Subscribe { interest } => registry.subscribe(device()?, interest).await?,
        OpPayload::Unsubscribe { interest } => registry.unsubscribe(device()?, interest).await?,
        OpPayload::SetSubscriptions { interests } => {
            registry.set_subscriptions(device()?, interests).await?
        }
        OpPayload::RefreshToken { token } => registry.refresh_token(device()?, token).await?,
        OpPayload::SetMetadata { metadata } => registry.set_metadata(device()?, metadata).await?,
        OpPayload::SetUserId { user_id } => {
            let bearer = fetch_token(settings, user_id).await?;
            registry.set_user_id(device()?, user_id, &bearer).await?
        }
    }
    Ok(Outcome::Done)
}

/// Asks the token provider for a JWT on a blocking thread.
async fn fetch_token(settings: &Settings, user_id: &str) -> std::result::Result<String, JobError> {
    let provider = settings
        .token_provider
        .clone()
        .ok_or(JobError::NoTokenProvider)?;
    let owned = user_id.to_string();
    let token = tokio::task::spawn_blocking(move || provider.fetch_token(&owned))
        .await
        .map_err(|e| TokenError::new(user_id, e.to_string()))??;
    Ok(token)
}

fn commit(
    scope: &Scope,
    settings: &Settings,
    job: &Job,
    result: std::result::Result<Outcome, JobError>,
) -> Result<()> {
    scope.mutate(|local| match result {
        Ok(Outcome::Registered(registered)) => record_registration(scope, local, job, registered),
        Ok(Outcome::Done) => {
            local.queue.complete(job.seq)?;
            tracing::debug!(seq = job.seq, kind = job.payload.kind(), "operation confirmed");
            Ok(())
        }
        Err(JobError::Registry(e)) if e.is_device_gone() && job.payload.requires_device_id() => {
            recover_device(scope, settings, local, job)
        }
        Err(e) => drop_failed(scope, local, job, &e),
    })
}

/// Stores the new device id and rebuilds local interests from the
/// registry's initial set plus everything still queued behind the
/// registration.
fn record_registration(
    scope: &Scope,
    local: &mut LocalState,
    job: &Job,
    registered: RegisterDeviceResult,
) -> Result<()> {
    if let Some(existing) = local.store.device_id() {
        tracing::debug!(device_id = existing, "already registered, ignoring registration result");
    } else {
        let interests = replay(
            registered.initial_interests,
            local
                .queue
                .iter()
                .filter(|op| op.seq != job.seq)
                .map(|op| &op.payload),
        );
        let identity = DeviceIdentity::new(
            local.store.paths().instance_id(),
            Some(registered.device_id.clone()),
        );
        local.store.put(identity)?;
        local.store.set_interests(interests)?;
        tracing::info!(device_id = %registered.device_id, "device registered");
    }

    local.queue.complete(job.seq)?;
    if let Some(device_id) = local.store.device_id() {
        scope.set_registration(RegistrationStatus::Registered(device_id.to_string()));
    }
    Ok(())
}

/// The registry no longer knows the device. Registers again, naming the
/// lost id, then restores interests and user ahead of the failed operation.
fn recover_device(
    scope: &Scope,
    settings: &Settings,
    local: &mut LocalState,
    job: &Job,
) -> Result<()> {
    let Some(token) = local.store.token().map(str::to_string) else {
        let err = JobError::Unregistered;
        return drop_failed(scope, local, job, &err);
    };

    let mut known_ids = local.store.previous_device_ids().to_vec();
    if let Some(lost) = local.store.device_id() {
        if !known_ids.iter().any(|id| id == lost) {
            known_ids.push(lost.to_string());
        }
    }
    let metadata = local
        .store
        .metadata()
        .cloned()
        .unwrap_or_else(|| settings.metadata.clone());

    let mut recovery = vec![
        OpPayload::register(token, known_ids, metadata),
        OpPayload::set_subscriptions(local.store.interests().clone()),
    ];
    if let Some(user_id) = local.store.user_id() {
        recovery.push(OpPayload::set_user_id(user_id.to_string()));
    }

    local.queue.push_front(recovery)?;
    let lost = local.store.forget_device()?;
    scope.set_registration(RegistrationStatus::Pending);
    tracing::warn!(
        device_id = lost.as_deref().unwrap_or_default(),
        "device unknown to registry, registering again"
    );
    Ok(())
}

/// Removes an operation that can never succeed and undoes its optimistic
/// local effect where one exists.
fn drop_failed(scope: &Scope, local: &mut LocalState, job: &Job, err: &JobError) -> Result<()> {
    tracing::warn!(
        seq = job.seq,
        kind = job.payload.kind(),
        "dropping operation: {}",
        err
    );
    local.queue.complete(job.seq)?;

    match &job.payload {
        OpPayload::SetUserId { user_id } if local.store.user_id() == Some(user_id.as_str()) => {
            local.store.set_user_id(None)?;
        }
        OpPayload::Register { .. } if local.store.device_id().is_none() => {
            scope.set_registration(RegistrationStatus::Failed(err.to_string()));
        }
        _ => {}
    }
    Ok(())
}
